/**
 * Turn a chapter weightage configuration into concrete per-chapter question
 * quotas.
 *
 * Each chapter's share is its weight divided by the total weight (weights do not
 * need to sum to 100), rounded to an integer and clamped to the configured
 * per-chapter bounds. Rounding and clamping leave a difference against the
 * requested total, which is repaired deterministically: chapters are visited in
 * weight-descending order, repeatedly, adding or removing one question at a time
 * until the total is exact or every chapter is pinned at a bound.
 *
 * Author:  Ian Fisher (iafisher@fastmail.com)
 * Version: June 2026
 */
use std::cmp::Ordering;

use serde::Serialize;

use super::common::ChapterWeight;


/// The number of questions one chapter contributes to a paper. Computed fresh
/// per request and never persisted.
#[derive(Serialize, Debug, Clone)]
pub struct ChapterQuota {
    pub chapter_id: i64,
    pub chapter_name: String,
    pub weight: f64,
    pub questions_needed: usize,
}


/// Allocate `total_questions` across `chapters` in proportion to their weights.
///
/// Always returns a best-effort result, never an error. The sum of the quotas
/// equals `total_questions` exactly whenever that total lies within
/// `[len * min_per_chapter, len * max_per_chapter]`; outside that range the sum
/// is pinned at the nearest achievable value. If every weight is zero the total
/// is split equally, keeping the floor and dropping the remainder.
pub fn allocate_quotas(
    chapters: &[ChapterWeight],
    total_questions: usize,
    min_per_chapter: usize,
    max_per_chapter: usize,
) -> Vec<ChapterQuota> {
    if chapters.is_empty() {
        return Vec::new();
    }

    let total_weight: f64 = chapters.iter().map(|c| c.weight).sum();
    if total_weight == 0.0 {
        // Equal-split fallback. The remainder of the floor division is left
        // unassigned.
        let each = total_questions / chapters.len();
        return chapters
            .iter()
            .map(|c| quota_for(c, each))
            .collect();
    }

    let mut quotas: Vec<ChapterQuota> = chapters
        .iter()
        .map(|c| {
            let exact = total_questions as f64 * c.weight / total_weight;
            let rounded = exact.round() as usize;
            quota_for(c, clamp(rounded, min_per_chapter, max_per_chapter))
        })
        .collect();

    let assigned: usize = quotas.iter().map(|q| q.questions_needed).sum();
    let mut diff = total_questions as i64 - assigned as i64;
    if diff == 0 {
        return quotas;
    }

    // Visit chapters heaviest-first so the repair lands on the chapters that
    // dominate the paper anyway.
    let mut order: Vec<usize> = (0..quotas.len()).collect();
    order.sort_by(|&a, &b| {
        chapters[b]
            .weight
            .partial_cmp(&chapters[a].weight)
            .unwrap_or(Ordering::Equal)
    });

    while diff != 0 {
        let mut moved = false;
        for &i in order.iter() {
            if diff == 0 {
                break;
            }
            if diff > 0 && quotas[i].questions_needed < max_per_chapter {
                quotas[i].questions_needed += 1;
                diff -= 1;
                moved = true;
            } else if diff < 0 && quotas[i].questions_needed > min_per_chapter {
                quotas[i].questions_needed -= 1;
                diff += 1;
                moved = true;
            }
        }
        // Every chapter is pinned at a bound; the requested total is not
        // achievable and the current sum is the best effort.
        if !moved {
            break;
        }
    }

    quotas
}


fn quota_for(chapter: &ChapterWeight, questions_needed: usize) -> ChapterQuota {
    ChapterQuota {
        chapter_id: chapter.chapter_id,
        chapter_name: chapter.chapter_name.clone(),
        weight: chapter.weight,
        questions_needed,
    }
}


fn clamp(value: usize, min: usize, max: usize) -> usize {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}
