use crate::core::{Result, ZeroShotError};
use serde::Serialize;

/// A candidate label with its score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
}

/// Label scores ordered by descending score. Ties keep candidate order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    scores: Vec<LabelScore>,
}

impl ClassificationResult {
    pub fn iter(&self) -> std::slice::Iter<'_, LabelScore> {
        self.scores.iter()
    }

    /// Highest-scoring label.
    pub fn top(&self) -> Option<&LabelScore> {
        self.scores.first()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn score_of(&self, label: &str) -> Option<f32> {
        self.scores
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.score)
    }

    /// Labels in ranked order.
    pub fn labels(&self) -> Vec<&str> {
        self.scores.iter().map(|s| s.label.as_str()).collect()
    }

    pub fn into_vec(self) -> Vec<LabelScore> {
        self.scores
    }
}

impl IntoIterator for ClassificationResult {
    type Item = LabelScore;
    type IntoIter = std::vec::IntoIter<LabelScore>;

    fn into_iter(self) -> Self::IntoIter {
        self.scores.into_iter()
    }
}

impl<'a> IntoIterator for &'a ClassificationResult {
    type Item = &'a LabelScore;
    type IntoIter = std::slice::Iter<'a, LabelScore>;

    fn into_iter(self) -> Self::IntoIter {
        self.scores.iter()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResultRanker;

impl ResultRanker {
    pub fn rank(&self, labels: &[String], scores: &[f32]) -> Result<ClassificationResult> {
        if labels.len() != scores.len() {
            return Err(ZeroShotError::numeric(
                None,
                format!("{} scores for {} labels", scores.len(), labels.len()),
            ));
        }

        let mut ranked: Vec<LabelScore> = labels
            .iter()
            .zip(scores)
            .map(|(label, &score)| LabelScore {
                label: label.clone(),
                score,
            })
            .collect();

        // `sort_by` is stable, so equal scores stay in candidate order.
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        Ok(ClassificationResult { scores: ranked })
    }
}
