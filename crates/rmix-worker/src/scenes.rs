//! Scene ordering for stitch jobs.

use std::collections::HashSet;

use rmix_models::{SceneEntry, SceneInput};

use crate::error::{WorkerError, WorkerResult};

/// Scenes in concatenation order plus the duplicates that were dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneOrder {
    pub scenes: Vec<SceneEntry>,
    pub dropped: Vec<SceneEntry>,
}

impl SceneOrder {
    /// Scene numbers in concatenation order.
    pub fn numbers(&self) -> Vec<i64> {
        self.scenes.iter().map(|s| s.scene_number).collect()
    }
}

/// Sort scenes ascending by scene number.
///
/// When a number repeats, the first entry in request order is kept and the
/// later ones are dropped. Non-numeric scene numbers are rejected.
pub fn order_scenes(inputs: &[SceneInput]) -> WorkerResult<SceneOrder> {
    if inputs.is_empty() {
        return Err(WorkerError::validation("videos must contain at least one scene"));
    }

    let mut seen = HashSet::new();
    let mut scenes = Vec::with_capacity(inputs.len());
    let mut dropped = Vec::new();

    for (index, input) in inputs.iter().enumerate() {
        let number = input
            .scene_number
            .as_ref()
            .ok_or_else(|| WorkerError::validation(format!("videos[{}].scene_number is required", index)))?
            .value()
            .map_err(|e| WorkerError::validation(format!("videos[{}]: {}", index, e)))?;
        let url = input.video_url().ok_or_else(|| {
            WorkerError::validation(format!("videos[{}].final_video_url is required", index))
        })?;

        let entry = SceneEntry::new(number, url);
        if seen.insert(number) {
            scenes.push(entry);
        } else {
            dropped.push(entry);
        }
    }

    scenes.sort_by_key(|s| s.scene_number);

    Ok(SceneOrder { scenes, dropped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmix_models::SceneNumber;

    fn scene(number: SceneNumber, url: &str) -> SceneInput {
        SceneInput {
            scene_number: Some(number),
            final_video_url: Some(url.to_string()),
        }
    }

    #[test]
    fn test_orders_ascending() {
        let inputs = vec![
            scene(SceneNumber::Integer(3), "c"),
            scene(SceneNumber::Integer(1), "a"),
            scene(SceneNumber::Integer(2), "b"),
        ];
        let order = order_scenes(&inputs).unwrap();

        let urls: Vec<&str> = order.scenes.iter().map(|s| s.video_url.as_str()).collect();
        assert_eq!(urls, vec!["a", "b", "c"]);
        assert_eq!(order.numbers(), vec![1, 2, 3]);
        assert!(order.dropped.is_empty());
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let inputs = vec![
            scene(SceneNumber::Text("10".into()), "ten"),
            scene(SceneNumber::Text(" 2 ".into()), "two"),
        ];
        let order = order_scenes(&inputs).unwrap();
        assert_eq!(order.numbers(), vec![2, 10]);
    }

    #[test]
    fn test_duplicates_first_seen_wins() {
        let inputs = vec![
            scene(SceneNumber::Integer(2), "first"),
            scene(SceneNumber::Integer(1), "one"),
            scene(SceneNumber::Integer(2), "second"),
        ];
        let order = order_scenes(&inputs).unwrap();

        assert_eq!(order.numbers(), vec![1, 2]);
        assert_eq!(order.scenes[1].video_url, "first");
        assert_eq!(order.dropped, vec![SceneEntry::new(2, "second")]);
    }

    #[test]
    fn test_non_numeric_rejected() {
        let inputs = vec![scene(SceneNumber::Text("intro".into()), "x")];
        let err = order_scenes(&inputs).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("videos[0]"));
    }

    #[test]
    fn test_empty_rejected() {
        assert!(order_scenes(&[]).unwrap_err().is_validation());
    }
}
