/**
 * A SQLite-backed question bank.
 *
 * This is the bank implementation the platform runs against and the fixture the
 * test suite seeds. The insert helpers are the deposit path for the external
 * question sources (previous-year imports, the AI pipeline, manual entry); the
 * generator itself only ever reads.
 *
 * Author:  Ian Fisher (iafisher@fastmail.com)
 * Version: August 2026
 */
use std::collections::HashSet;
use std::path::Path;

use rusqlite::{params, Connection};

use super::bank::{Chapter, QuestionBank, QuestionRecord, Subject};
use super::common::{Difficulty, GenError, Result, Source};


pub struct SqliteBank {
    connection: Connection,
}

impl SqliteBank {
    pub fn open(path: &Path) -> Result<SqliteBank> {
        let connection = Connection::open(path).map_err(GenError::Sql)?;
        create_tables(&connection)?;
        Ok(SqliteBank { connection })
    }

    pub fn open_in_memory() -> Result<SqliteBank> {
        let connection = Connection::open_in_memory().map_err(GenError::Sql)?;
        create_tables(&connection)?;
        Ok(SqliteBank { connection })
    }

    pub fn add_subject(&self, code: &str, name: &str) -> Result<i64> {
        self.connection
            .execute(
                "INSERT INTO subjects(code, name) VALUES (?1, ?2)",
                params![code, name],
            )
            .map_err(GenError::Sql)?;
        Ok(self.connection.last_insert_rowid())
    }

    pub fn add_chapter(
        &self,
        subject_id: i64,
        name: &str,
        weightage: f64,
        is_active: bool,
    ) -> Result<i64> {
        self.connection
            .execute(
                "INSERT INTO chapters(subject, name, weightage, active)
                 VALUES (?1, ?2, ?3, ?4)",
                params![subject_id, name, weightage, is_active],
            )
            .map_err(GenError::Sql)?;
        Ok(self.connection.last_insert_rowid())
    }

    pub fn add_question(
        &self,
        chapter_id: i64,
        text: &str,
        options: &[String],
        difficulty: Difficulty,
        source: Source,
        is_verified: bool,
        marks: i64,
    ) -> Result<i64> {
        let options_json = serde_json::to_string(options).map_err(GenError::Json)?;
        self.connection
            .execute(
                "INSERT INTO questions(chapter, text, options, difficulty, source, verified, marks)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    chapter_id,
                    text,
                    options_json,
                    difficulty.as_str(),
                    source.as_str(),
                    is_verified,
                    marks
                ],
            )
            .map_err(GenError::Sql)?;
        Ok(self.connection.last_insert_rowid())
    }
}


impl QuestionBank for SqliteBank {
    fn subject(&self, subject_id: i64) -> Result<Option<Subject>> {
        let mut stmt = self
            .connection
            .prepare("SELECT id, code, name FROM subjects WHERE id = ?1")
            .map_err(GenError::Sql)?;
        let mut rows = stmt.query(params![subject_id]).map_err(GenError::Sql)?;
        match rows.next().map_err(GenError::Sql)? {
            Some(row) => Ok(Some(subject_from_row(row)?)),
            None => Ok(None),
        }
    }

    fn subject_by_code(&self, code: &str) -> Result<Option<Subject>> {
        let mut stmt = self
            .connection
            .prepare("SELECT id, code, name FROM subjects WHERE code = ?1")
            .map_err(GenError::Sql)?;
        let mut rows = stmt.query(params![code]).map_err(GenError::Sql)?;
        match rows.next().map_err(GenError::Sql)? {
            Some(row) => Ok(Some(subject_from_row(row)?)),
            None => Ok(None),
        }
    }

    fn chapters(&self, subject_id: i64) -> Result<Vec<Chapter>> {
        let mut stmt = self
            .connection
            .prepare(
                "SELECT id, subject, name, weightage, active
                 FROM chapters WHERE subject = ?1 ORDER BY id",
            )
            .map_err(GenError::Sql)?;
        let mut rows = stmt.query(params![subject_id]).map_err(GenError::Sql)?;

        let mut chapters = Vec::new();
        while let Some(row) = rows.next().map_err(GenError::Sql)? {
            chapters.push(Chapter {
                id: row.get(0).map_err(GenError::Sql)?,
                subject_id: row.get(1).map_err(GenError::Sql)?,
                name: row.get(2).map_err(GenError::Sql)?,
                weightage: row.get(3).map_err(GenError::Sql)?,
                is_active: row.get(4).map_err(GenError::Sql)?,
            });
        }
        Ok(chapters)
    }

    fn chapter_questions(
        &self,
        chapter_id: i64,
        verified_only: bool,
        exclude: &HashSet<i64>,
    ) -> Result<Vec<QuestionRecord>> {
        let sql = if verified_only {
            "SELECT id, chapter, text, options, difficulty, source, verified, marks
             FROM questions WHERE chapter = ?1 AND verified = 1 ORDER BY id"
        } else {
            "SELECT id, chapter, text, options, difficulty, source, verified, marks
             FROM questions WHERE chapter = ?1 ORDER BY id"
        };
        let mut stmt = self.connection.prepare(sql).map_err(GenError::Sql)?;
        let mut rows = stmt.query(params![chapter_id]).map_err(GenError::Sql)?;

        let mut questions = Vec::new();
        while let Some(row) = rows.next().map_err(GenError::Sql)? {
            let id: i64 = row.get(0).map_err(GenError::Sql)?;
            if exclude.contains(&id) {
                continue;
            }

            let options_json: String = row.get(3).map_err(GenError::Sql)?;
            let difficulty_label: String = row.get(4).map_err(GenError::Sql)?;
            let source_label: String = row.get(5).map_err(GenError::Sql)?;
            questions.push(QuestionRecord {
                id,
                chapter_id: row.get(1).map_err(GenError::Sql)?,
                text: row.get(2).map_err(GenError::Sql)?,
                options: serde_json::from_str(&options_json).map_err(GenError::Json)?,
                difficulty: Difficulty::from_label(&difficulty_label).ok_or(
                    GenError::UnknownLabel { field: "difficulty", value: difficulty_label },
                )?,
                source: Source::from_label(&source_label).ok_or(GenError::UnknownLabel {
                    field: "source",
                    value: source_label,
                })?,
                is_verified: row.get(6).map_err(GenError::Sql)?,
                marks: row.get(7).map_err(GenError::Sql)?,
            });
        }
        Ok(questions)
    }
}


fn subject_from_row(row: &rusqlite::Row) -> Result<Subject> {
    Ok(Subject {
        id: row.get(0).map_err(GenError::Sql)?,
        code: row.get(1).map_err(GenError::Sql)?,
        name: row.get(2).map_err(GenError::Sql)?,
    })
}


fn create_tables(connection: &Connection) -> Result<()> {
    connection
        .execute(
            "
        CREATE TABLE IF NOT EXISTS subjects(
          id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
          code TEXT UNIQUE NOT NULL CHECK(code != ''),
          name TEXT NOT NULL CHECK(name != ''),
          created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        ",
            [],
        )
        .map_err(GenError::Sql)?;
    connection
        .execute(
            "
        CREATE TABLE IF NOT EXISTS chapters(
          id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
          subject INTEGER NOT NULL REFERENCES subjects,
          name TEXT NOT NULL CHECK(name != ''),
          weightage REAL NOT NULL DEFAULT 0 CHECK(weightage >= 0),
          active BOOLEAN NOT NULL DEFAULT 1,
          created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        ",
            [],
        )
        .map_err(GenError::Sql)?;
    connection
        .execute(
            "
        CREATE TABLE IF NOT EXISTS questions(
          id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
          chapter INTEGER NOT NULL REFERENCES chapters,
          text TEXT NOT NULL CHECK(text != ''),
          options TEXT NOT NULL DEFAULT '[]',
          difficulty TEXT NOT NULL CHECK(
            difficulty = 'easy' OR
            difficulty = 'medium' OR
            difficulty = 'hard'
          ),
          source TEXT NOT NULL CHECK(
            source = 'previous_year' OR
            source = 'ai_generated' OR
            source = 'manual'
          ),
          verified BOOLEAN NOT NULL DEFAULT 0,
          marks INTEGER NOT NULL DEFAULT 2,
          created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        ",
            [],
        )
        .map_err(GenError::Sql)?;
    Ok(())
}
