//! Cross-review aggregation: corroborated complaints, meme currency, and
//! sentiment breakdown.

use std::collections::HashMap;

use crate::config::{
    MAX_VERIFIED_COMPLAINTS, MIN_CONFIDENCE_THRESHOLD, MIN_CORROBORATING_REVIEWS,
};
use crate::criticism::{self, CriticismCategory};
use crate::types::{
    AnimeMetadata, Review, ReviewContext, Sentiment, SentimentBreakdown, VerifiedComplaint,
};

/// Low-effort reaction phrases tracked across reviews. A phrase only counts
/// when it shows up in at least two distinct reviews.
const MEME_PHRASES: &[&str] = &[
    "mid",
    "cope",
    "copium",
    "touch grass",
    "ratio",
    "rent free",
    "based",
    "cringe",
    "kino",
    "sneed",
    "chud",
    "literally me",
];

/// Rating-free sentiment lexicons used when a review carries no numeric score.
const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "worst", "disappointing", "waste", "regret",
];
const POSITIVE_WORDS: &[&str] = &[
    "great", "amazing", "best", "masterpiece", "excellent", "love",
];

struct CategoryBucket {
    confidences: Vec<f32>,
    review_count: u32,
    examples: Vec<String>,
}

/// Identify complaints corroborated across independent reviews.
///
/// A category only becomes a verified complaint once at least two distinct
/// reviews each contribute a qualifying sentence (negative or mixed sentiment
/// at or above the confidence threshold). Results are sorted by average
/// confidence weighted by review count and truncated to the top five.
pub fn identify_verified_criticisms(
    reviews: &[Review],
    min_confidence: f32,
) -> Vec<VerifiedComplaint> {
    let mut buckets: HashMap<CriticismCategory, CategoryBucket> = HashMap::new();

    for review in reviews {
        let text = review.text();
        if text.is_empty() {
            continue;
        }

        for category in CriticismCategory::ALL {
            let Some(sentence) = criticism::find_complaint_sentence(text, category) else {
                continue;
            };
            let (sentiment, confidence) = criticism::classify(&sentence, category);
            if !matches!(sentiment, Sentiment::Negative | Sentiment::Mixed) {
                continue;
            }
            if confidence < min_confidence {
                continue;
            }

            let bucket = buckets.entry(category).or_insert_with(|| CategoryBucket {
                confidences: Vec::new(),
                review_count: 0,
                examples: Vec::new(),
            });
            bucket.confidences.push(confidence);
            bucket.review_count += 1;
            if bucket.examples.len() < 3 {
                // quotes land in a line-oriented prompt block, so flatten
                // any line breaks inside the sentence
                let example = sentence.split_whitespace().collect::<Vec<_>>().join(" ");
                if !bucket.examples.contains(&example) {
                    bucket.examples.push(example);
                }
            }
        }
    }

    let mut verified: Vec<VerifiedComplaint> = buckets
        .into_iter()
        .filter(|(_, bucket)| bucket.review_count >= MIN_CORROBORATING_REVIEWS)
        .map(|(category, bucket)| {
            let avg =
                bucket.confidences.iter().sum::<f32>() / bucket.confidences.len() as f32;
            VerifiedComplaint {
                category,
                confidence: avg,
                review_count: bucket.review_count,
                example_quotes: bucket.examples,
            }
        })
        .collect();

    verified.sort_by(|a, b| {
        let wa = a.confidence * a.review_count as f32;
        let wb = b.confidence * b.review_count as f32;
        wb.partial_cmp(&wa).unwrap_or(std::cmp::Ordering::Equal)
    });
    verified.truncate(MAX_VERIFIED_COMPLAINTS);
    verified
}

/// Count meme phrases that appear in at least two distinct reviews.
pub fn extract_community_memes(reviews: &[Review]) -> Vec<(String, u32)> {
    let mut counts: HashMap<&'static str, u32> = HashMap::new();

    for review in reviews {
        let lower = review.text().to_lowercase();
        for phrase in MEME_PHRASES {
            if lower.contains(phrase) {
                *counts.entry(phrase).or_insert(0) += 1;
            }
        }
    }

    let mut memes: Vec<(String, u32)> = counts
        .into_iter()
        .filter(|(_, count)| *count >= 2)
        .map(|(phrase, count)| (phrase.to_string(), count))
        .collect();
    memes.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    memes
}

/// Bucket reviews into a positive/mixed/negative breakdown.
///
/// Reviews with a numeric rating are banded directly; unrated reviews fall
/// back to word lexicons, with ties counted as neutral (dropped from the
/// positive/negative tallies but kept in the total).
pub fn sentiment_breakdown(reviews: &[Review]) -> SentimentBreakdown {
    if reviews.is_empty() {
        return SentimentBreakdown::default();
    }

    let mut positive = 0u32;
    let mut mixed = 0u32;
    let mut negative = 0u32;

    for review in reviews {
        match review.rating {
            Some(rating) if rating >= 8 => positive += 1,
            Some(rating) if rating >= 6 => positive += 1,
            Some(rating) if rating >= 4 => mixed += 1,
            Some(_) => negative += 1,
            None => {
                let lower = review.text().to_lowercase();
                let neg = NEGATIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();
                let pos = POSITIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();
                if neg > pos {
                    negative += 1;
                } else if pos > neg {
                    positive += 1;
                }
                // tie → neutral, counted only in the total
            }
        }
    }

    let total = reviews.len() as u32;
    SentimentBreakdown {
        positive,
        mixed,
        negative,
        total,
        positive_pct: positive as f32 * 100.0 / total as f32,
        negative_pct: negative as f32 * 100.0 / total as f32,
    }
}

/// Assemble the full review context for one anime.
pub fn build_review_context(
    reviews: &[Review],
    metadata: &AnimeMetadata,
) -> ReviewContext {
    ReviewContext {
        review_count: reviews.len(),
        verified_complaints: identify_verified_criticisms(reviews, MIN_CONFIDENCE_THRESHOLD),
        sentiment: sentiment_breakdown(reviews),
        meme_phrases: extract_community_memes(reviews),
        score_out_of_10: metadata.score_out_of_10(),
        is_controversial: metadata.controversy_score > crate::config::CONTROVERSY_THRESHOLD,
        controversy_score: metadata.controversy_score,
    }
}
