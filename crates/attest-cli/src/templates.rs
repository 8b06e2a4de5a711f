pub const GITIGNORE: &str = "/.attest/\n*.db\n*.db-shm\n*.db-wal\n/run.json\n";
