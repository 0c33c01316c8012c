/// Generate SQL migrations for the PostgreSQL state store
///
/// These migrations create the job type and ticket tables and their indexes.
pub fn generate_migrations() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "20240401000000_initial_schema",
            r#"
            -- Job types and their per-stage flags
            CREATE TABLE IF NOT EXISTS job_types (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                workflow_steps JSONB NOT NULL DEFAULT '{}'::jsonb,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );

            CREATE TABLE IF NOT EXISTS tickets (
                id TEXT PRIMARY KEY,
                job_type_id TEXT NOT NULL,
                ticket_number TEXT NOT NULL,
                customer_name TEXT NOT NULL DEFAULT '',
                description TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                current_workflow_step TEXT,
                version BIGINT NOT NULL DEFAULT 0,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tickets_job_type_id ON tickets(job_type_id);
            CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status);
            "#,
        ),
        (
            "20240402000000_additional_indexes",
            r#"
            -- Front desk lookups and oldest-first listing
            CREATE INDEX IF NOT EXISTS idx_tickets_ticket_number ON tickets(ticket_number);
            CREATE INDEX IF NOT EXISTS idx_tickets_created_at ON tickets(created_at);
            "#,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_ordered() {
        let migrations = generate_migrations();
        let names: Vec<&str> = migrations.iter().map(|(name, _)| *name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_ticket_table_tracks_version() {
        let (_, schema) = generate_migrations()[0];
        assert!(schema.contains("CREATE TABLE IF NOT EXISTS tickets"));
        assert!(schema.contains("version BIGINT NOT NULL"));
        assert!(schema.contains("workflow_steps JSONB"));
    }
}
