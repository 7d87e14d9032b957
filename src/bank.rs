/**
 * The question bank's domain records and the `QuestionBank` trait through which the
 * generator queries it. The bank itself is owned by the wider application; this
 * crate only reads from it.
 *
 * Author:  Ian Fisher (iafisher@fastmail.com)
 * Version: August 2026
 */
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::common::{Difficulty, Result, Source};


#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub id: i64,
    /// Short unique code, e.g. "CS" for Computer Science.
    pub code: String,
    pub name: String,
}


#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Chapter {
    pub id: i64,
    pub subject_id: i64,
    pub name: String,
    /// Stored default weightage for this chapter within its subject.
    pub weightage: f64,
    /// Inactive chapters are skipped when a request does not name chapters
    /// explicitly.
    pub is_active: bool,
}


/// A single question as stored in the bank. Read-only to this crate; the text
/// and answer options are opaque display fields carried through to the paper.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct QuestionRecord {
    pub id: i64,
    pub chapter_id: i64,
    pub text: String,
    pub options: Vec<String>,
    pub difficulty: Difficulty,
    pub source: Source,
    pub is_verified: bool,
    pub marks: i64,
}


/// The interface the generator needs from the question repository. Kept
/// deliberately small so the bank can be backed by SQLite (see the
/// `persistence` module), an ORM, or a test double.
pub trait QuestionBank {
    fn subject(&self, subject_id: i64) -> Result<Option<Subject>>;

    /// Look a subject up by its short code. Used by mock generation to find
    /// the general Paper 1 pool.
    fn subject_by_code(&self, code: &str) -> Result<Option<Subject>>;

    /// All chapters of a subject, active or not, with their stored weightage.
    fn chapters(&self, subject_id: i64) -> Result<Vec<Chapter>>;

    /// All questions in a chapter that are not in `exclude`. When
    /// `verified_only` is set, unverified questions are filtered out.
    fn chapter_questions(
        &self,
        chapter_id: i64,
        verified_only: bool,
        exclude: &HashSet<i64>,
    ) -> Result<Vec<QuestionRecord>>;
}
