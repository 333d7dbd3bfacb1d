//! Schema and demo data for the SQLite store.

pub(super) const PRAGMAS: &str = "PRAGMA foreign_keys = ON;";

pub(super) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
  pid INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL,
  descr TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS tasks (
  tid INTEGER PRIMARY KEY AUTOINCREMENT,
  pid INTEGER NOT NULL REFERENCES projects(pid),
  descr TEXT NOT NULL DEFAULT '',
  completed INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS tasks_by_pid ON tasks(pid);

CREATE VIEW IF NOT EXISTS projects_with_pending AS
  SELECT projects.pid AS pid,
         projects.name AS name,
         projects.descr AS descr,
         COUNT(tasks.tid) AS pending
  FROM projects
  LEFT JOIN tasks ON tasks.pid = projects.pid AND tasks.completed = 0
  GROUP BY projects.pid;
"#;

/// Two sample projects. Only loaded into an empty database.
pub(super) const SEED: &str = r#"
INSERT INTO projects (pid, name, descr) VALUES
  (25, 'Writing a Book on Web Dev Tools',
   'Tasks required to write a book on the tools required to develop a web application'),
  (34, 'Cook a Spanish omelette',
   'Steps to cook a Spanish omelette or "tortilla"');

INSERT INTO tasks (tid, pid, descr, completed) VALUES
  (1, 25, 'Figure out what kind of application to develop', 1),
  (2, 25, 'Decide what tools to use', 0),
  (3, 25, 'Create repositories for text and samples', 1),
  (4, 34, 'Peel and dice the potatoes', 1),
  (5, 34, 'Fry the potatoes', 1),
  (6, 34, 'Peel and chop the onions', 0),
  (7, 34, 'Saute the onions', 0),
  (8, 34, 'Beat the eggs', 0),
  (9, 34, 'Mix everything and fry', 0);
"#;
