//! Paint order for flowers in the garden.
//!
//! Spotlit ideas sit on a sentinel layer above everything else. The rest are
//! ranked by vertical position so flowers lower in the garden overlap the
//! ones behind them.

use crate::idea_model::Idea;

pub const SPOTLIGHT_RANK: i64 = 1000;
pub const BASE_RANK: i64 = 10;

pub fn z_rank(idea: &Idea) -> i64 {
    if idea.is_new {
        SPOTLIGHT_RANK
    } else {
        BASE_RANK + idea.y.floor() as i64
    }
}

/// Ideas ordered back to front. The sort is stable, so equal ranks keep
/// insertion order and the later idea paints on top.
pub fn render_order(ideas: &[Idea]) -> Vec<&Idea> {
    let mut ordered: Vec<&Idea> = ideas.iter().collect();
    ordered.sort_by_key(|idea| z_rank(idea));
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idea_model::FlowerType;

    fn idea(id: &str, y: f64, is_new: bool) -> Idea {
        Idea {
            id: id.to_string(),
            title: id.to_string(),
            description: "d".to_string(),
            date: "1/1/2025".to_string(),
            x: 50.0,
            y,
            flower_type: FlowerType::Daisy,
            flower_image: None,
            scale: 1.2,
            is_new,
        }
    }

    #[test]
    fn test_rank_from_y() {
        assert_eq!(z_rank(&idea("a", 22.0, false)), 32);
        assert_eq!(z_rank(&idea("b", 77.99, false)), 87);
        assert_eq!(z_rank(&idea("c", 40.0, true)), SPOTLIGHT_RANK);
    }

    #[test]
    fn test_spotlit_paints_last_and_lower_overlaps_higher() {
        let ideas = vec![
            idea("fresh", 30.0, true),
            idea("low", 70.0, false),
            idea("high", 25.0, false),
        ];
        let ids: Vec<&str> = render_order(&ideas).iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "low", "fresh"]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let ideas = vec![idea("first", 50.2, false), idea("second", 50.7, false)];
        let ids: Vec<&str> = render_order(&ideas).iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }
}
