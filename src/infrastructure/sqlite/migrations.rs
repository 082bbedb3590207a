use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS deals (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            target_market TEXT,
            sectors TEXT NOT NULL DEFAULT '[]',
            stage TEXT NOT NULL,
            country TEXT NOT NULL,
            region TEXT,
            business_model TEXT,
            revenue REAL,
            growth_rate REAL,
            burn_rate REAL,
            team_size INTEGER,
            features TEXT NOT NULL DEFAULT '[]',
            flags TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS weight_profiles (
            investor_id TEXT PRIMARY KEY,
            market REAL NOT NULL,
            traction REAL NOT NULL,
            team REAL NOT NULL,
            financial REAL NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS score_history (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            deal_id TEXT NOT NULL REFERENCES deals(id),
            investor_id TEXT NOT NULL,
            value INTEGER NOT NULL,
            tier TEXT NOT NULL,
            breakdown TEXT NOT NULL,
            missing TEXT NOT NULL DEFAULT '[]',
            weights_used TEXT NOT NULL,
            weights_normalized INTEGER NOT NULL DEFAULT 0,
            computed_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS theses (
            id TEXT PRIMARY KEY,
            investor_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            criteria TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            version INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS thesis_matches (
            thesis_id TEXT NOT NULL REFERENCES theses(id),
            deal_id TEXT NOT NULL REFERENCES deals(id),
            match_score REAL NOT NULL,
            semantic_similarity REAL,
            semantic_unavailable INTEGER NOT NULL DEFAULT 0,
            vetoed_by TEXT,
            matched_criteria TEXT NOT NULL DEFAULT '[]',
            computed_at TEXT NOT NULL,
            PRIMARY KEY (thesis_id, deal_id)
        );

        CREATE TABLE IF NOT EXISTS alerts (
            id TEXT PRIMARY KEY,
            investor_id TEXT NOT NULL,
            alert_type TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            severity TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'unread',
            deal_ids TEXT NOT NULL DEFAULT '[]',
            portfolio_ids TEXT NOT NULL DEFAULT '[]',
            primary_entity TEXT NOT NULL DEFAULT '',
            rule TEXT NOT NULL,
            action_required INTEGER NOT NULL DEFAULT 0,
            triggered_at TEXT NOT NULL,
            read_at TEXT,
            expires_at TEXT
        );

        DROP INDEX IF EXISTS idx_scores_pair;
        CREATE INDEX IF NOT EXISTS idx_scores_pair_time ON score_history(deal_id, investor_id, computed_at, seq);
        CREATE INDEX IF NOT EXISTS idx_theses_investor ON theses(investor_id);
        CREATE INDEX IF NOT EXISTS idx_matches_score ON thesis_matches(thesis_id, match_score);
        CREATE INDEX IF NOT EXISTS idx_alerts_investor ON alerts(investor_id, triggered_at);
        CREATE INDEX IF NOT EXISTS idx_alerts_dedup ON alerts(investor_id, alert_type, primary_entity, status);
        "
    ).map_err(|e| format!("Migration failed: {e}"))
}
