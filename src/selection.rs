/**
 * Choose the questions for a single chapter.
 *
 * The selector tries to honor the paper's difficulty and source targets by
 * sampling within each difficulty/source partition of the chapter's pool, then
 * backfills from whatever is left when the partitions run short. The caller
 * threads one exclusion set through every chapter of a paper, which is what
 * keeps a finished paper free of duplicate questions.
 *
 * Author:  Ian Fisher (iafisher@fastmail.com)
 * Version: June 2026
 */
use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use super::bank::{QuestionBank, QuestionRecord};
use super::common::{DifficultySplit, Result, SourceSplit};


/// What one chapter contributed to a paper.
#[derive(Debug)]
pub struct ChapterSelection {
    pub questions: Vec<QuestionRecord>,
    /// The quota the chapter was asked for; `questions.len()` may be smaller
    /// if the chapter's pool was exhausted.
    pub required: usize,
    /// True if the chapter had no verified questions and unverified ones were
    /// drawn instead.
    pub used_unverified_fallback: bool,
}


/// Select up to `required` questions from one chapter, approximating the
/// difficulty and source targets.
///
/// Every id handed out is added to `exclude` so that later chapters (and later
/// partitions within this call) cannot pick it again. The returned list is
/// never longer than `required` and never contains a duplicate, but it may be
/// shorter than `required` when the chapter does not have enough questions;
/// that shortfall is the assembler's problem, not an error here.
pub fn select_for_chapter<B, R>(
    bank: &B,
    chapter_id: i64,
    required: usize,
    difficulty_split: &DifficultySplit,
    source_split: &SourceSplit,
    exclude: &mut HashSet<i64>,
    rng: &mut R,
) -> Result<ChapterSelection>
where
    B: QuestionBank + ?Sized,
    R: Rng,
{
    let mut used_unverified_fallback = false;
    let mut pool = bank.chapter_questions(chapter_id, true, exclude)?;
    if pool.is_empty() {
        // Sparse chapters (common while the bank is still being filled) get
        // the relaxed query that includes unverified questions.
        pool = bank.chapter_questions(chapter_id, false, exclude)?;
        if !pool.is_empty() {
            used_unverified_fallback = true;
            log::warn!(
                "chapter {} has no verified questions; falling back to unverified",
                chapter_id
            );
        }
    }

    if pool.len() <= required {
        for question in pool.iter() {
            exclude.insert(question.id);
        }
        return Ok(ChapterSelection {
            questions: pool,
            required,
            used_unverified_fallback,
        });
    }

    let mut selected: Vec<QuestionRecord> = Vec::new();
    for (difficulty, difficulty_pct) in difficulty_split.entries().iter() {
        let target = round_share(required, *difficulty_pct);
        for (source, source_pct) in source_split.entries().iter() {
            let sub_target = round_share(target, *source_pct);
            if sub_target == 0 {
                continue;
            }
            let mut partition: Vec<&QuestionRecord> = pool
                .iter()
                .filter(|q| {
                    q.difficulty == *difficulty
                        && q.source == *source
                        && !exclude.contains(&q.id)
                })
                .collect();
            partition.shuffle(rng);
            for question in partition.into_iter().take(sub_target) {
                exclude.insert(question.id);
                selected.push(question.clone());
            }
        }
    }

    // The partitions can run short when the chapter's inventory is skewed
    // against the targets; top up from whatever remains in the chapter.
    if selected.len() < required {
        let mut rest: Vec<&QuestionRecord> = pool
            .iter()
            .filter(|q| !exclude.contains(&q.id))
            .collect();
        rest.shuffle(rng);
        for question in rest.into_iter().take(required - selected.len()) {
            exclude.insert(question.id);
            selected.push(question.clone());
        }
    }

    // Rounding the nested targets can also overshoot.
    selected.truncate(required);

    Ok(ChapterSelection {
        questions: selected,
        required,
        used_unverified_fallback,
    })
}


fn round_share(count: usize, pct: f64) -> usize {
    (count as f64 * pct / 100.0).round() as usize
}
