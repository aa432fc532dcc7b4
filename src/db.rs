use rusqlite::Connection;
use std::path::Path;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("tutord.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS profiles(
            user_id TEXT PRIMARY KEY,
            role TEXT NOT NULL CHECK(role IN ('student','teacher')),
            first_name TEXT,
            last_name TEXT,
            avatar_url TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // Local mirror of the identity provider's user records, fed by webhooks.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS identities(
            user_id TEXT PRIMARY KEY,
            first_name TEXT,
            last_name TEXT,
            image_url TEXT,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS classes(
            class_id TEXT PRIMARY KEY,
            teacher_id TEXT NOT NULL,
            class_name TEXT NOT NULL,
            description TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_classes_teacher ON classes(teacher_id)",
        [],
    )?;

    // The composite primary key is what keeps duplicate enrollment out,
    // including concurrent retries of the same add.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS class_members(
            class_id TEXT NOT NULL,
            student_id TEXT NOT NULL,
            joined_at TEXT NOT NULL,
            PRIMARY KEY(class_id, student_id),
            FOREIGN KEY(class_id) REFERENCES classes(class_id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_class_members_student ON class_members(student_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS assignments(
            assignment_id TEXT PRIMARY KEY,
            class_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            scenario_id TEXT,
            due_date TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(class_id) REFERENCES classes(class_id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_assignments_class ON assignments(class_id)",
        [],
    )?;

    // Reports are immutable once written; array fields are JSON text.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS session_reports(
            report_id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            assignment_id TEXT,
            companion_id TEXT NOT NULL,
            transcript TEXT NOT NULL,
            pronunciation_score INTEGER NOT NULL,
            fluency_score INTEGER NOT NULL,
            grammar_feedback TEXT NOT NULL,
            session_duration INTEGER NOT NULL,
            tutor_type TEXT NOT NULL,
            topic TEXT NOT NULL,
            vocabulary_used TEXT NOT NULL,
            improvements TEXT NOT NULL,
            achievements TEXT NOT NULL,
            audio_url TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_session_reports_student
         ON session_reports(student_id, created_at)",
        [],
    )?;

    Ok(conn)
}
