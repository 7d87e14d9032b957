/**
 * Definitions of data structures used by several modules, such as `GenError`, the
 * difficulty/source label sets, and the configuration structs for paper generation.
 *
 * Author:  Ian Fisher (iafisher@fastmail.com)
 * Version: August 2026
 */
use std::error;
use std::fmt;

use serde::{Deserialize, Serialize};


pub type Result<T> = std::result::Result<T, GenError>;

/// How far a distribution's percentages may stray from 100 before validation
/// rejects it.
pub const DISTRIBUTION_TOLERANCE: f64 = 0.1;

/// Default bounds on the number of questions allocated to a single chapter.
pub const DEFAULT_MIN_PER_CHAPTER: usize = 1;
pub const DEFAULT_MAX_PER_CHAPTER: usize = 15;

/// Number of questions drawn from the general Paper 1 pool in a mock test.
pub const MOCK_PAPER1_QUESTIONS: usize = 50;


#[derive(Debug)]
pub enum GenError {
    /// For when a generation request names a subject that does not exist.
    SubjectNotFound(i64),
    /// For when the well-known Paper 1 subject is missing from the bank.
    Paper1SubjectMissing(String),
    /// For when a subject has no active chapters to allocate over.
    NoChapters(i64),
    /// For when the bank could not supply enough questions to clear the
    /// shortfall tolerance.
    InsufficientQuestions { generated: usize, required: usize },
    /// For when one half of a mock generation failed.
    MockPaperFailed { paper: PaperType, message: String },
    /// For a generation request whose configuration is unusable, e.g. a mock
    /// test with no room for the Paper 2 pool. `validate_paper_config` catches
    /// these earlier when the caller runs it.
    ConfigRejected(String),
    /// For a question row whose difficulty or source label is not recognized.
    UnknownLabel { field: &'static str, value: String },
    /// For SQLite errors from the question bank.
    Sql(rusqlite::Error),
    /// For JSON errors while decoding a question's display payload.
    Json(serde_json::Error),
}


impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            GenError::SubjectNotFound(id) => {
                write!(f, "subject {} not found", id)
            },
            GenError::Paper1SubjectMissing(ref code) => {
                write!(f, "Paper 1 subject '{}' not found in the question bank", code)
            },
            GenError::NoChapters(id) => {
                write!(f, "subject {} has no active chapters", id)
            },
            GenError::InsufficientQuestions { generated, required } => {
                write!(
                    f,
                    "insufficient questions: generated {} of {} required",
                    generated, required
                )
            },
            GenError::MockPaperFailed { paper, ref message } => {
                write!(f, "mock generation failed for {}: {}", paper.as_str(), message)
            },
            GenError::ConfigRejected(ref message) => {
                write!(f, "invalid configuration: {}", message)
            },
            GenError::UnknownLabel { field, ref value } => {
                write!(f, "unknown {} label '{}'", field, value)
            },
            GenError::Sql(ref err) => {
                write!(f, "database error ({})", err)
            },
            GenError::Json(ref err) => {
                write!(f, "could not parse JSON ({})", err)
            },
        }
    }
}


impl error::Error for GenError {
    fn cause(&self) -> Option<&dyn error::Error> {
        match *self {
            GenError::Sql(ref err) => Some(err),
            GenError::Json(ref err) => Some(err),
            _ => None,
        }
    }
}


/// The difficulty grade attached to every question in the bank.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_label(label: &str) -> Option<Difficulty> {
        match label {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}


/// Where a question came from: scanned previous-year papers, the AI pipeline,
/// or manual entry by a subject expert.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    PreviousYear,
    AiGenerated,
    Manual,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::PreviousYear => "previous_year",
            Source::AiGenerated => "ai_generated",
            Source::Manual => "manual",
        }
    }

    pub fn from_label(label: &str) -> Option<Source> {
        match label {
            "previous_year" => Some(Source::PreviousYear),
            "ai_generated" => Some(Source::AiGenerated),
            "manual" => Some(Source::Manual),
            _ => None,
        }
    }
}


#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaperType {
    Paper1,
    Paper2,
    Mock,
}

impl PaperType {
    pub fn as_str(self) -> &'static str {
        match self {
            PaperType::Paper1 => "paper1",
            PaperType::Paper2 => "paper2",
            PaperType::Mock => "mock",
        }
    }
}


#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PracticeType {
    ChapterWise,
    Mixed,
    Revision,
}

impl PracticeType {
    pub fn as_str(self) -> &'static str {
        match self {
            PracticeType::ChapterWise => "chapter_wise",
            PracticeType::Mixed => "mixed",
            PracticeType::Revision => "revision",
        }
    }
}


/// Target percentage of the paper drawn from each difficulty grade. The
/// percentages are expected to sum to 100; `validate_paper_config` checks this,
/// the allocator and selector do not.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DifficultySplit {
    pub easy: f64,
    pub medium: f64,
    pub hard: f64,
}

impl DifficultySplit {
    pub fn new() -> Self {
        DifficultySplit { easy: 30.0, medium: 50.0, hard: 20.0 }
    }

    /// The split as (grade, percentage) pairs, in a fixed order.
    pub fn entries(&self) -> [(Difficulty, f64); 3] {
        [
            (Difficulty::Easy, self.easy),
            (Difficulty::Medium, self.medium),
            (Difficulty::Hard, self.hard),
        ]
    }

    pub fn total(&self) -> f64 {
        self.easy + self.medium + self.hard
    }
}


/// Target percentage of the paper drawn from each question source.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SourceSplit {
    pub previous_year: f64,
    pub ai_generated: f64,
    pub manual: f64,
}

impl SourceSplit {
    pub fn new() -> Self {
        SourceSplit { previous_year: 70.0, ai_generated: 30.0, manual: 0.0 }
    }

    pub fn entries(&self) -> [(Source, f64); 3] {
        [
            (Source::PreviousYear, self.previous_year),
            (Source::AiGenerated, self.ai_generated),
            (Source::Manual, self.manual),
        ]
    }

    pub fn total(&self) -> f64 {
        self.previous_year + self.ai_generated + self.manual
    }
}


/// A caller-supplied chapter weight, used to override the weightage stored
/// with the subject.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChapterWeight {
    pub chapter_id: i64,
    pub chapter_name: String,
    pub weight: f64,
}


/// Holds the full configuration for one paper generation request. Every
/// recognized option appears here with its default; there are no
/// silently-defaulted lookups at the point of use.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PaperConfig {
    pub subject_id: i64,
    pub paper_type: PaperType,
    pub total_questions: usize,
    pub difficulty_split: DifficultySplit,
    pub source_split: SourceSplit,
    /// If set, replaces the subject's stored chapter weightage.
    pub weightage_override: Option<Vec<ChapterWeight>>,
    pub min_per_chapter: usize,
    pub max_per_chapter: usize,
}

impl PaperConfig {
    pub fn new(subject_id: i64, paper_type: PaperType, total_questions: usize) -> Self {
        PaperConfig {
            subject_id,
            paper_type,
            total_questions,
            difficulty_split: DifficultySplit::new(),
            source_split: SourceSplit::new(),
            weightage_override: None,
            min_per_chapter: DEFAULT_MIN_PER_CHAPTER,
            max_per_chapter: DEFAULT_MAX_PER_CHAPTER,
        }
    }
}


/// Configuration for a practice test.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PracticeConfig {
    pub subject_id: i64,
    pub total_questions: usize,
    /// Restrict the test to these chapters. `None` means all active chapters
    /// of the subject.
    pub chapter_ids: Option<Vec<i64>>,
    pub practice_type: PracticeType,
    pub difficulty_split: DifficultySplit,
    pub source_split: SourceSplit,
    pub min_per_chapter: usize,
    pub max_per_chapter: usize,
}

impl PracticeConfig {
    pub fn new(subject_id: i64, total_questions: usize) -> Self {
        PracticeConfig {
            subject_id,
            total_questions,
            chapter_ids: None,
            practice_type: PracticeType::ChapterWise,
            difficulty_split: DifficultySplit::new(),
            source_split: SourceSplit::new(),
            min_per_chapter: DEFAULT_MIN_PER_CHAPTER,
            max_per_chapter: DEFAULT_MAX_PER_CHAPTER,
        }
    }
}


/// The outcome of a pre-flight configuration check. Callers should inspect
/// `valid` before invoking generation; the check never raises.
#[derive(Serialize, Debug)]
pub struct ConfigReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ConfigReport {
    fn from_errors(errors: Vec<String>) -> Self {
        ConfigReport { valid: errors.is_empty(), errors }
    }
}


/// Check a paper configuration before generation. Field presence and label
/// membership are enforced by the types; this checks the numeric constraints.
pub fn validate_paper_config(config: &PaperConfig) -> ConfigReport {
    let mut errors = Vec::new();

    if config.total_questions == 0 {
        errors.push(String::from("total_questions must be a positive integer"));
    }
    if config.paper_type == PaperType::Mock
        && config.total_questions <= MOCK_PAPER1_QUESTIONS
    {
        errors.push(format!(
            "mock papers must request more than {} questions",
            MOCK_PAPER1_QUESTIONS
        ));
    }
    check_split_total("difficulty_distribution", config.difficulty_split.total(), &mut errors);
    check_split_total("source_distribution", config.source_split.total(), &mut errors);
    check_split_signs(
        "difficulty_distribution",
        &[
            config.difficulty_split.easy,
            config.difficulty_split.medium,
            config.difficulty_split.hard,
        ],
        &mut errors,
    );
    check_split_signs(
        "source_distribution",
        &[
            config.source_split.previous_year,
            config.source_split.ai_generated,
            config.source_split.manual,
        ],
        &mut errors,
    );
    if config.min_per_chapter > config.max_per_chapter {
        errors.push(String::from("min_per_chapter must not exceed max_per_chapter"));
    }
    if let Some(chapters) = &config.weightage_override {
        if chapters.is_empty() {
            errors.push(String::from("weightage_config must name at least one chapter"));
        }
        for chapter in chapters.iter() {
            if chapter.weight < 0.0 {
                errors.push(format!(
                    "chapter {} has a negative weight",
                    chapter.chapter_id
                ));
            }
        }
    }

    ConfigReport::from_errors(errors)
}


/// Check a practice test configuration before generation.
pub fn validate_practice_config(config: &PracticeConfig) -> ConfigReport {
    let mut errors = Vec::new();

    if config.total_questions == 0 {
        errors.push(String::from("total_questions must be a positive integer"));
    }
    check_split_total("difficulty_distribution", config.difficulty_split.total(), &mut errors);
    check_split_total("source_distribution", config.source_split.total(), &mut errors);
    if config.min_per_chapter > config.max_per_chapter {
        errors.push(String::from("min_per_chapter must not exceed max_per_chapter"));
    }
    if let Some(chapter_ids) = &config.chapter_ids {
        if chapter_ids.is_empty() {
            errors.push(String::from("chapter_ids must not be empty"));
        }
    }

    ConfigReport::from_errors(errors)
}


fn check_split_total(name: &str, total: f64, errors: &mut Vec<String>) {
    if (total - 100.0).abs() > DISTRIBUTION_TOLERANCE {
        errors.push(format!("{} percentages must sum to 100 (got {})", name, total));
    }
}


fn check_split_signs(name: &str, percentages: &[f64], errors: &mut Vec<String>) {
    if percentages.iter().any(|&pct| pct < 0.0) {
        errors.push(format!("{} percentages must not be negative", name));
    }
}
