/**
 * Assemble complete papers out of per-chapter selections.
 *
 * The generator runs the allocator over the subject's chapter weightage, pulls
 * each chapter's quota through the selector with one shared exclusion set (so a
 * finished paper never repeats a question), shuffles the combined sequence so
 * the chapter structure is not visible to the exam-taker, and reports the
 * realized distribution next to the targets. Mock tests run the pipeline twice,
 * once against the general Paper 1 pool and once against the subject, and merge
 * the results; practice tests run it over an explicit chapter subset with a
 * looser shortfall tolerance.
 *
 * Author:  Ian Fisher (iafisher@fastmail.com)
 * Version: August 2026
 */
use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};
use serde::Serialize;

use super::allocation::allocate_quotas;
use super::bank::{QuestionBank, QuestionRecord};
use super::common::{
    ChapterWeight, Difficulty, DifficultySplit, GenError, PaperConfig, PaperType,
    PracticeConfig, PracticeType, Result, Source, SourceSplit, MOCK_PAPER1_QUESTIONS,
};
use super::selection::select_for_chapter;


/// The well-known subject code of the general aptitude Paper 1 pool.
pub const PAPER1_SUBJECT_CODE: &str = "NET-P1";

// A paper succeeds if it reaches this fraction of the requested count.
const PAPER_SHORTFALL_TOLERANCE: f64 = 0.8;
// Practice tests tolerate a thinner bank.
const PRACTICE_SHORTFALL_TOLERANCE: f64 = 0.6;
// With this many chapters or fewer, a practice test ignores stored weightage
// and splits equally, so one heavy chapter cannot dominate focused practice.
const EQUAL_SPLIT_CHAPTER_LIMIT: usize = 3;
// UGC NET pacing: 180 minutes for 120 marks.
const MINUTES_PER_QUESTION: f64 = 1.5;


/// A question placed on a paper, tagged with the paper it was drawn for.
/// The tag distinguishes the two pools of a merged mock test.
#[derive(Serialize, Debug, Clone)]
pub struct PaperQuestion {
    pub paper: PaperType,
    pub question: QuestionRecord,
}


#[derive(Serialize, Debug, Clone)]
pub struct DifficultyCounts {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

impl DifficultyCounts {
    fn new() -> Self {
        DifficultyCounts { easy: 0, medium: 0, hard: 0 }
    }

    fn bump(&mut self, difficulty: Difficulty) {
        match difficulty {
            Difficulty::Easy => self.easy += 1,
            Difficulty::Medium => self.medium += 1,
            Difficulty::Hard => self.hard += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.easy + self.medium + self.hard
    }
}


#[derive(Serialize, Debug, Clone)]
pub struct SourceCounts {
    pub previous_year: usize,
    pub ai_generated: usize,
    pub manual: usize,
}

impl SourceCounts {
    fn new() -> Self {
        SourceCounts { previous_year: 0, ai_generated: 0, manual: 0 }
    }

    fn bump(&mut self, source: Source) {
        match source {
            Source::PreviousYear => self.previous_year += 1,
            Source::AiGenerated => self.ai_generated += 1,
            Source::Manual => self.manual += 1,
        }
    }
}


/// What one chapter was asked for and what it delivered.
#[derive(Serialize, Debug, Clone)]
pub struct ChapterStats {
    pub chapter_id: i64,
    pub chapter_name: String,
    pub weightage: f64,
    pub required: usize,
    pub generated: usize,
}


/// The realized distribution of a generated paper. A successful generation can
/// still fall short of the requested count, so callers that need exact
/// fulfillment must compare `total_questions` against their request.
#[derive(Serialize, Debug, Clone)]
pub struct PaperStatistics {
    pub total_questions: usize,
    pub chapters: Vec<ChapterStats>,
    pub difficulty: DifficultyCounts,
    pub sources: SourceCounts,
    /// True if any chapter ran out of verified questions and unverified ones
    /// were drawn instead.
    pub used_unverified_fallback: bool,
}


#[derive(Serialize, Debug)]
pub struct GeneratedPaper {
    pub questions: Vec<PaperQuestion>,
    pub statistics: PaperStatistics,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}


#[derive(Serialize, Debug, Clone)]
pub struct PracticeStatistics {
    pub practice_type: PracticeType,
    pub selected_chapters: Vec<String>,
    pub estimated_time_minutes: f64,
    pub difficulty_level: Difficulty,
}


#[derive(Serialize, Debug)]
pub struct GeneratedPractice {
    pub paper: GeneratedPaper,
    pub practice: PracticeStatistics,
}


/// Generates papers against a question bank. Construct one per application and
/// hand it the bank it should read from; each generation call is independent
/// and keeps no state on the generator.
pub struct PaperGenerator<B> {
    bank: B,
}

impl<B: QuestionBank> PaperGenerator<B> {
    pub fn new(bank: B) -> Self {
        PaperGenerator { bank }
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    /// Generate a paper with an unseeded RNG. Two calls with the same
    /// configuration produce different papers; that is the point.
    pub fn generate_paper(&self, config: &PaperConfig) -> Result<GeneratedPaper> {
        self.generate_paper_with_rng(config, &mut thread_rng())
    }

    pub fn generate_paper_with_rng<R: Rng>(
        &self,
        config: &PaperConfig,
        rng: &mut R,
    ) -> Result<GeneratedPaper> {
        match config.paper_type {
            PaperType::Mock => self.generate_mock(config, rng),
            paper => {
                let mut exclude = HashSet::new();
                self.generate_pool(
                    config.subject_id,
                    paper,
                    config.total_questions,
                    &config.difficulty_split,
                    &config.source_split,
                    config.weightage_override.as_deref(),
                    config.min_per_chapter,
                    config.max_per_chapter,
                    PAPER_SHORTFALL_TOLERANCE,
                    &mut exclude,
                    rng,
                )
            },
        }
    }

    pub fn generate_practice_test(
        &self,
        config: &PracticeConfig,
    ) -> Result<GeneratedPractice> {
        self.generate_practice_test_with_rng(config, &mut thread_rng())
    }

    pub fn generate_practice_test_with_rng<R: Rng>(
        &self,
        config: &PracticeConfig,
        rng: &mut R,
    ) -> Result<GeneratedPractice> {
        if self.bank.subject(config.subject_id)?.is_none() {
            return Err(GenError::SubjectNotFound(config.subject_id));
        }

        let chapters = self.bank.chapters(config.subject_id)?;
        let mut selected: Vec<ChapterWeight> = chapters
            .into_iter()
            .filter(|chapter| match &config.chapter_ids {
                Some(ids) => ids.contains(&chapter.id),
                None => chapter.is_active,
            })
            .map(|chapter| ChapterWeight {
                chapter_id: chapter.id,
                chapter_name: chapter.name,
                weight: chapter.weightage,
            })
            .collect();
        if selected.is_empty() {
            return Err(GenError::NoChapters(config.subject_id));
        }
        if selected.len() <= EQUAL_SPLIT_CHAPTER_LIMIT {
            let share = 100.0 / selected.len() as f64;
            for chapter in selected.iter_mut() {
                chapter.weight = share;
            }
        }

        let mut exclude = HashSet::new();
        let paper = self.generate_pool(
            config.subject_id,
            PaperType::Paper2,
            config.total_questions,
            &config.difficulty_split,
            &config.source_split,
            Some(&selected),
            config.min_per_chapter,
            config.max_per_chapter,
            PRACTICE_SHORTFALL_TOLERANCE,
            &mut exclude,
            rng,
        )?;

        let practice = PracticeStatistics {
            practice_type: config.practice_type,
            selected_chapters: selected
                .iter()
                .map(|chapter| chapter.chapter_name.clone())
                .collect(),
            estimated_time_minutes: paper.statistics.total_questions as f64
                * MINUTES_PER_QUESTION,
            difficulty_level: difficulty_level(&paper.statistics.difficulty),
        };
        Ok(GeneratedPractice { paper, practice })
    }

    /// Run the allocator and selector over one subject and return the shuffled
    /// pool, or an error if the result falls below `tolerance` of `total`.
    fn generate_pool<R: Rng>(
        &self,
        subject_id: i64,
        paper: PaperType,
        total: usize,
        difficulty_split: &DifficultySplit,
        source_split: &SourceSplit,
        weightage_override: Option<&[ChapterWeight]>,
        min_per_chapter: usize,
        max_per_chapter: usize,
        tolerance: f64,
        exclude: &mut HashSet<i64>,
        rng: &mut R,
    ) -> Result<GeneratedPaper> {
        if self.bank.subject(subject_id)?.is_none() {
            return Err(GenError::SubjectNotFound(subject_id));
        }

        let weights = match weightage_override {
            Some(weights) => weights.to_vec(),
            None => self.stored_weights(subject_id)?,
        };

        let quotas = allocate_quotas(&weights, total, min_per_chapter, max_per_chapter);

        let mut questions: Vec<PaperQuestion> = Vec::new();
        let mut chapter_stats = Vec::new();
        let mut used_unverified_fallback = false;
        for quota in quotas.iter() {
            let selection = select_for_chapter(
                &self.bank,
                quota.chapter_id,
                quota.questions_needed,
                difficulty_split,
                source_split,
                exclude,
                rng,
            )?;
            used_unverified_fallback =
                used_unverified_fallback || selection.used_unverified_fallback;
            chapter_stats.push(ChapterStats {
                chapter_id: quota.chapter_id,
                chapter_name: quota.chapter_name.clone(),
                weightage: quota.weight,
                required: quota.questions_needed,
                generated: selection.questions.len(),
            });
            for question in selection.questions {
                questions.push(PaperQuestion { paper, question });
            }
        }

        questions.shuffle(rng);

        if (questions.len() as f64) < total as f64 * tolerance {
            return Err(GenError::InsufficientQuestions {
                generated: questions.len(),
                required: total,
            });
        }

        let statistics =
            compute_statistics(&questions, chapter_stats, used_unverified_fallback);
        Ok(GeneratedPaper {
            questions,
            statistics,
            generated_at: chrono::Utc::now(),
        })
    }

    fn generate_mock<R: Rng>(
        &self,
        config: &PaperConfig,
        rng: &mut R,
    ) -> Result<GeneratedPaper> {
        if config.total_questions <= MOCK_PAPER1_QUESTIONS {
            return Err(GenError::ConfigRejected(format!(
                "mock papers must request more than {} questions",
                MOCK_PAPER1_QUESTIONS
            )));
        }
        let paper1_subject = match self.bank.subject_by_code(PAPER1_SUBJECT_CODE)? {
            Some(subject) => subject,
            None => {
                return Err(GenError::Paper1SubjectMissing(String::from(
                    PAPER1_SUBJECT_CODE,
                )));
            },
        };

        let mut exclude = HashSet::new();
        let paper1 = self
            .generate_pool(
                paper1_subject.id,
                PaperType::Paper1,
                MOCK_PAPER1_QUESTIONS,
                &config.difficulty_split,
                &config.source_split,
                None,
                config.min_per_chapter,
                config.max_per_chapter,
                PAPER_SHORTFALL_TOLERANCE,
                &mut exclude,
                rng,
            )
            .map_err(|e| GenError::MockPaperFailed {
                paper: PaperType::Paper1,
                message: e.to_string(),
            })?;
        let paper2 = self
            .generate_pool(
                config.subject_id,
                PaperType::Paper2,
                config.total_questions - MOCK_PAPER1_QUESTIONS,
                &config.difficulty_split,
                &config.source_split,
                config.weightage_override.as_deref(),
                config.min_per_chapter,
                config.max_per_chapter,
                PAPER_SHORTFALL_TOLERANCE,
                &mut exclude,
                rng,
            )
            .map_err(|e| GenError::MockPaperFailed {
                paper: PaperType::Paper2,
                message: e.to_string(),
            })?;

        let mut questions = paper1.questions;
        questions.extend(paper2.questions);
        questions.shuffle(rng);

        let mut chapters = paper1.statistics.chapters;
        chapters.extend(paper2.statistics.chapters);
        let used_unverified_fallback = paper1.statistics.used_unverified_fallback
            || paper2.statistics.used_unverified_fallback;
        let statistics = compute_statistics(&questions, chapters, used_unverified_fallback);

        Ok(GeneratedPaper {
            questions,
            statistics,
            generated_at: chrono::Utc::now(),
        })
    }

    fn stored_weights(&self, subject_id: i64) -> Result<Vec<ChapterWeight>> {
        let chapters = self.bank.chapters(subject_id)?;
        let weights: Vec<ChapterWeight> = chapters
            .into_iter()
            .filter(|chapter| chapter.is_active)
            .map(|chapter| ChapterWeight {
                chapter_id: chapter.id,
                chapter_name: chapter.name,
                weight: chapter.weightage,
            })
            .collect();
        if weights.is_empty() {
            return Err(GenError::NoChapters(subject_id));
        }
        Ok(weights)
    }
}


fn compute_statistics(
    questions: &[PaperQuestion],
    chapters: Vec<ChapterStats>,
    used_unverified_fallback: bool,
) -> PaperStatistics {
    let mut difficulty = DifficultyCounts::new();
    let mut sources = SourceCounts::new();
    for paper_question in questions.iter() {
        difficulty.bump(paper_question.question.difficulty);
        sources.bump(paper_question.question.source);
    }
    PaperStatistics {
        total_questions: questions.len(),
        chapters,
        difficulty,
        sources,
        used_unverified_fallback,
    }
}


/// Grade a whole paper from its realized difficulty counts.
fn difficulty_level(counts: &DifficultyCounts) -> Difficulty {
    let total = counts.total();
    if total == 0 {
        return Difficulty::Medium;
    }
    let hard_share = counts.hard as f64 / total as f64;
    let easy_share = counts.easy as f64 / total as f64;
    if hard_share >= 0.4 {
        Difficulty::Hard
    } else if easy_share >= 0.5 {
        Difficulty::Easy
    } else {
        Difficulty::Medium
    }
}
