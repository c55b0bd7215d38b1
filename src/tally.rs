//! Weighted tally over every stored vote
//!
//! A first choice is worth 3 points, a second 2 and a third 1. The fold is
//! a pure function of the votes and the trip options, so the order votes
//! arrive in never changes the outcome.

use std::collections::BTreeMap;

use log::*;

use crate::api_models::{Results, Standing};
use crate::models::{Rank, TripId, TripOption, Vote};

pub fn compute_results(votes: Vec<Vote>, trips: &[TripOption]) -> Results {
    let mut trip_scores: BTreeMap<TripId, u32> = trips.iter().map(|t| (t.id, 0)).collect();
    let mut first_choice_count: BTreeMap<TripId, u32> =
        trips.iter().map(|t| (t.id, 0)).collect();

    for vote in votes.iter() {
        for (rank, trip) in vote.ranked().iter() {
            match trip_scores.get_mut(trip) {
                Some(score) => *score += rank.points(),
                None => {
                    warn!(
                        "Vote {} ranks unknown trip {} as {}, ignoring it",
                        vote.id, trip, rank
                    );
                    continue;
                }
            }
            if *rank == Rank::First {
                if let Some(count) = first_choice_count.get_mut(trip) {
                    *count += 1;
                }
            }
        }
    }

    let standings = standings(trips, &trip_scores, &first_choice_count, votes.len());

    Results {
        total_votes: votes.len(),
        trip_scores,
        first_choice_count,
        all_votes: votes,
        standings,
    }
}

/**
 * Trips by score, highest first. Ties go to the trip more people ranked
 * first, then to the lower id.
 */
fn standings(
    trips: &[TripOption],
    scores: &BTreeMap<TripId, u32>,
    firsts: &BTreeMap<TripId, u32>,
    total_votes: usize,
) -> Vec<Standing> {
    let mut standings: Vec<Standing> = trips
        .iter()
        .map(|trip| {
            let first_choice_count = firsts.get(&trip.id).copied().unwrap_or(0);
            Standing {
                trip_id: trip.id,
                title: trip.title.clone(),
                score: scores.get(&trip.id).copied().unwrap_or(0),
                first_choice_count,
                first_choice_percent: percent(first_choice_count, total_votes),
            }
        })
        .collect();

    standings.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(b.first_choice_count.cmp(&a.first_choice_count))
            .then(a.trip_id.cmp(&b.trip_id))
    });
    standings
}

fn percent(count: u32, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(count) * 100.0 / total as f64).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TripCatalog;
    use chrono::Utc;
    use uuid::Uuid;

    fn trips() -> Vec<TripOption> {
        TripCatalog::embedded().unwrap().options().to_vec()
    }

    fn vote(name: &str, first: TripId, second: TripId, third: TripId) -> Vote {
        Vote {
            id: Uuid::new_v4(),
            name: name.to_string(),
            first_choice: first,
            second_choice: second,
            third_choice: third,
            comments: None,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn empty_tally_lists_every_trip_at_zero() {
        let results = compute_results(vec![], &trips());
        assert_eq!(results.total_votes, 0);
        assert_eq!(results.trip_scores.len(), 3);
        assert!(results.trip_scores.values().all(|score| *score == 0));
        assert!(results.first_choice_count.values().all(|count| *count == 0));
        assert!(results.all_votes.is_empty());
        assert!(results.standings.iter().all(|s| s.first_choice_percent == 0));
    }

    #[test]
    fn two_voters_split_the_top_spot() {
        let results = compute_results(
            vec![vote("Alex", 1, 2, 3), vote("Blair", 2, 1, 3)],
            &trips(),
        );

        assert_eq!(results.total_votes, 2);
        assert_eq!(results.trip_scores[&1], 5);
        assert_eq!(results.trip_scores[&2], 5);
        assert_eq!(results.trip_scores[&3], 2);
        assert_eq!(results.first_choice_count[&1], 1);
        assert_eq!(results.first_choice_count[&2], 1);
        assert_eq!(results.first_choice_count[&3], 0);
        assert_eq!(results.all_votes.len(), 2);
    }

    #[test]
    fn vote_order_does_not_change_the_tally() {
        let votes = vec![
            vote("Alex", 1, 2, 3),
            vote("Blair", 3, 1, 2),
            vote("Casey", 3, 2, 1),
            vote("Drew", 2, 3, 1),
        ];
        let mut reversed = votes.clone();
        reversed.reverse();
        let mut rotated = votes.clone();
        rotated.rotate_left(1);

        let expected = compute_results(votes, &trips());
        for shuffled in vec![reversed, rotated] {
            let results = compute_results(shuffled, &trips());
            assert_eq!(results.trip_scores, expected.trip_scores);
            assert_eq!(results.first_choice_count, expected.first_choice_count);
            assert_eq!(results.standings, expected.standings);
        }
    }

    #[test]
    fn standings_break_ties_on_first_choices_then_id() {
        // 1 and 2 both score 5, but trip 2 has both first-place votes.
        let results = compute_results(
            vec![vote("Alex", 2, 1, 3), vote("Blair", 2, 3, 1)],
            &trips(),
        );
        let order: Vec<TripId> = results.standings.iter().map(|s| s.trip_id).collect();
        assert_eq!(order, vec![2, 1, 3]);
        assert_eq!(results.standings[0].first_choice_percent, 100);

        let results = compute_results(
            vec![vote("Alex", 1, 2, 3), vote("Blair", 2, 1, 3)],
            &trips(),
        );
        let order: Vec<TripId> = results.standings.iter().map(|s| s.trip_id).collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert_eq!(results.standings[0].first_choice_percent, 50);
    }

    #[test]
    fn unknown_trips_do_not_score() {
        let results = compute_results(vec![vote("Alex", 7, 2, 3)], &trips());
        assert_eq!(results.trip_scores.len(), 3);
        assert_eq!(results.trip_scores[&1], 0);
        assert_eq!(results.trip_scores[&2], 2);
        assert_eq!(results.trip_scores[&3], 1);
        assert!(results.first_choice_count.values().all(|count| *count == 0));
        assert_eq!(results.total_votes, 1);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(compute_results(vec![vote("Alex", 1, 2, 3)], &trips()))
            .unwrap();
        assert_eq!(json["totalVotes"], 1);
        assert_eq!(json["tripScores"]["1"], 3);
        assert_eq!(json["firstChoiceCount"]["1"], 1);
        assert_eq!(json["allVotes"][0]["name"], "Alex");
        assert_eq!(json["standings"][0]["tripId"], 1);
    }
}
