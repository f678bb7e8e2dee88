//! Friend recommendation by number of common friends.
//!
//! Input lines read `user<TAB>friend friend ...`; tabs, spaces and commas are
//! all accepted as separators. Every pair of users who share a friend but are
//! not friends themselves is recommended to each other, weighted by the number
//! of friends they have in common.
//!
//! Output lines read `user<TAB>(friend,count),(friend,count),...` with at most
//! [`MAX_RECOMMENDATIONS`] entries per user, highest count first.
use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use mapreduce::algorithm::{Algorithm, Emitter};

/// Recommendations kept per user by the aggregate step.
pub const MAX_RECOMMENDATIONS: usize = 10;

/// Marks a pair of users that are already friends.
const ALREADY_FRIENDS: &str = "friends";

#[derive(Debug, Default, Clone, Copy)]
pub struct FriendRecommendation;

/// `a,b` with `a <= b`, so both directions of a pair share a key.
fn pair_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a},{b}")
    } else {
        format!("{b},{a}")
    }
}

impl Algorithm for FriendRecommendation {
    fn map(&self, line: &str, emit: &mut Emitter) -> Result<()> {
        let mut fields = line
            .split(|c: char| c == '\t' || c == ' ' || c == ',')
            .filter(|field| !field.is_empty());
        let Some(user) = fields.next() else {
            return Ok(());
        };
        let friends: Vec<&str> = fields.collect();

        for friend in &friends {
            emit.emit(pair_key(user, friend), ALREADY_FRIENDS);
        }
        for (i, a) in friends.iter().enumerate() {
            for b in &friends[i + 1..] {
                emit.emit(pair_key(a, b), 1);
            }
        }
        Ok(())
    }

    fn reduce(&self, key: &str, values: Vec<String>) -> Result<Option<Vec<String>>> {
        if values.iter().any(|value| value == ALREADY_FRIENDS) {
            return Ok(None);
        }

        let (a, b) = key
            .split_once(',')
            .ok_or_else(|| anyhow!("malformed user pair {key:?}"))?;
        let mut common = 0u64;
        for value in &values {
            common += value
                .parse::<u64>()
                .with_context(|| format!("invalid common friend count {value:?}"))?;
        }
        if common == 0 {
            return Ok(None);
        }

        Ok(Some(vec![
            format!("{a}\t({b},{common})"),
            format!("{b}\t({a},{common})"),
        ]))
    }

    fn aggregate(&self, lines: &[String]) -> Option<Result<Vec<String>>> {
        Some(top_recommendations(lines))
    }
}

fn parse_recommendation(line: &str) -> Result<(&str, &str, u64)> {
    let malformed = || anyhow!("malformed recommendation {line:?}");
    let (user, recommendation) = line.trim().split_once('\t').ok_or_else(malformed)?;
    let (friend, count) = recommendation
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .and_then(|pair| pair.split_once(','))
        .ok_or_else(malformed)?;
    let count = count.parse::<u64>().with_context(malformed)?;
    Ok((user, friend, count))
}

/// Group recommendations by user in first-seen order and keep the strongest
/// ones. Ties keep their reducer order.
fn top_recommendations(lines: &[String]) -> Result<Vec<String>> {
    let mut users: Vec<&str> = Vec::new();
    let mut by_user: HashMap<&str, Vec<(&str, u64)>> = HashMap::new();

    for line in lines {
        let (user, friend, count) = parse_recommendation(line)?;
        by_user
            .entry(user)
            .or_insert_with(|| {
                users.push(user);
                Vec::new()
            })
            .push((friend, count));
    }

    Ok(users
        .into_iter()
        .map(|user| {
            let mut recommendations = by_user.remove(user).unwrap_or_default();
            recommendations.sort_by(|a, b| b.1.cmp(&a.1));
            recommendations.truncate(MAX_RECOMMENDATIONS);
            let recommendations: Vec<String> = recommendations
                .into_iter()
                .map(|(friend, count)| format!("({friend},{count})"))
                .collect();
            format!("{user}\t{}", recommendations.join(","))
        })
        .collect())
}

#[cfg(test)]
mod test {
    use mapreduce::{mapper::map_chunk, partition::partition_records, reducer::group_runs};

    use super::*;
    use crate::Algorithms;

    fn map_line(line: &str) -> Vec<String> {
        let mut emit = Emitter::new();
        FriendRecommendation.map(line, &mut emit).unwrap();
        emit.into_records()
    }

    fn lines(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn it_marks_edges_and_counts_co_friends() {
        assert_eq!(
            map_line("1\t2 3"),
            vec!["1,2\tfriends", "1,3\tfriends", "2,3\t1"]
        );
        assert_eq!(map_line("9,10  2"), vec!["10,9\tfriends", "2,9\tfriends", "10,2\t1"]);
        assert!(map_line("7").is_empty());
    }

    #[test]
    fn it_never_recommends_existing_friends() {
        let reduced = FriendRecommendation
            .reduce("2,3", lines(&["1", "friends", "1"]))
            .unwrap();
        assert_eq!(reduced, None);

        let reduced = FriendRecommendation
            .reduce("2,5", lines(&["1", "1"]))
            .unwrap();
        assert_eq!(reduced, Some(lines(&["2\t(5,2)", "5\t(2,2)"])));
    }

    #[test]
    fn it_rejects_malformed_values() {
        assert!(FriendRecommendation.reduce("2,5", lines(&["x"])).is_err());
        assert!(FriendRecommendation.reduce("25", lines(&["1"])).is_err());
        assert!(top_recommendations(&lines(&["1 (2,3)"])).is_err());
        assert!(top_recommendations(&lines(&["1\t(2,three)"])).is_err());
    }

    #[test]
    fn it_keeps_the_strongest_recommendations_per_user() {
        let mut reduced = vec!["b\t(a,1)".to_string()];
        reduced.extend((0..12).map(|i| format!("a\t(f{i},{})", i % 4)));

        let aggregated = top_recommendations(&reduced).unwrap();
        assert_eq!(aggregated.len(), 2);
        assert_eq!(aggregated[0], "b\t(a,1)");
        assert_eq!(
            aggregated[1],
            "a\t(f3,3),(f7,3),(f11,3),(f2,2),(f6,2),(f10,2),(f1,1),(f5,1),(f9,1),(f0,0)"
        );
    }

    async fn run(input: &[&str]) -> Vec<String> {
        let mapped = map_chunk::<Algorithms>("friendrec", lines(input)).await.unwrap();
        let mut sorted = mapped;
        sorted.sort_by(|a, b| a.split('\t').next().cmp(&b.split('\t').next()));
        let assignment = partition_records(sorted, 1).unwrap();

        let mut reduced = Vec::new();
        for run in group_runs(assignment.records(0)) {
            if let Some(lines) = FriendRecommendation.reduce(&run.key, run.values).unwrap() {
                reduced.extend(lines);
            }
        }
        top_recommendations(&reduced).unwrap()
    }

    #[tokio::test]
    async fn it_recommends_nothing_inside_a_triangle() {
        let output = run(&["1\t2 3", "2\t1 3", "3\t1 2"]).await;
        assert!(output.is_empty(), "{output:?}");
    }

    #[tokio::test]
    async fn it_recommends_friends_of_friends() {
        let output = run(&["1\t2 3 4", "2\t1 3", "3\t1 2 5", "4\t1", "5\t3"]).await;
        assert_eq!(
            output,
            vec![
                "1\t(5,1)",
                "5\t(1,1),(2,1)",
                "2\t(4,1),(5,1)",
                "4\t(2,1),(3,1)",
                "3\t(4,1)",
            ]
        );
    }
}
