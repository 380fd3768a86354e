//! The four temporal-join inference rules, as pure functions over
//! committed views.
//!
//! Every rule is additive and idempotent: outputs are merged into the
//! graph, never deleted, and re-running a rule over unchanged views
//! produces the same edge set. Keeping the joins in plain code (rather
//! than backend queries) makes each rule unit-testable without a store.

use std::collections::BTreeSet;

use korpus_core::{EdgeType, EventView, InferredEdge, MicroActionView};

/// Link a reply-flagged micro-action to the most recent earlier
/// micro-action with swapped actor/recipient.
///
/// Requires known actor, recipient, and start date, and no existing reply
/// edge. The candidate is the one with the maximum start date strictly
/// before the reply's; date ties break on id so the result is
/// deterministic.
pub fn reply_links(micro_actions: &[MicroActionView]) -> Vec<InferredEdge> {
    let mut edges = Vec::new();

    for reply in micro_actions {
        if reply.has_reply_edge {
            continue;
        }
        let is_reply = reply
            .link_type
            .as_deref()
            .map(str::to_lowercase)
            .is_some_and(|lt| lt.contains("replies_to") || lt.contains("acknowledges_receipt"));
        if !is_reply {
            continue;
        }
        let (Some(actor), Some(recipient), Some(reply_start)) =
            (&reply.actor_id, &reply.recipient_id, reply.date_start)
        else {
            continue;
        };

        let original = micro_actions
            .iter()
            .filter(|original| original.id != reply.id)
            .filter(|original| {
                original.actor_id.as_deref() == Some(recipient.as_str())
                    && original.recipient_id.as_deref() == Some(actor.as_str())
            })
            .filter_map(|original| original.date_start.map(|start| (start, &original.id)))
            .filter(|(start, _)| *start < reply_start)
            .max();

        if let Some((_, original_id)) = original {
            edges.push(InferredEdge {
                from: reply.id.clone(),
                edge_type: EdgeType::RepliesTo,
                to: original_id.clone(),
                days_diff: None,
            });
        }
    }

    edges
}

/// Link an older micro-action to the next one in a time-ordered,
/// person-filtered communication sequence.
///
/// Both must share the same (actor, recipient) pair and a concerned
/// person, sit within `window_days` of each other, and have no qualifying
/// micro-action strictly between them.
pub fn chain_links(micro_actions: &[MicroActionView], window_days: i64) -> Vec<InferredEdge> {
    let mut edges = Vec::new();

    for newer in micro_actions {
        let (Some(actor), Some(recipient), Some(newer_start)) =
            (&newer.actor_id, &newer.recipient_id, newer.date_start)
        else {
            continue;
        };

        for older in micro_actions {
            let Some(older_start) = older.date_start else {
                continue;
            };
            if older.actor_id.as_deref() != Some(actor.as_str())
                || older.recipient_id.as_deref() != Some(recipient.as_str())
            {
                continue;
            }
            if newer_start <= older_start {
                continue;
            }
            let days_diff = (newer_start - older_start).num_days();
            if days_diff > window_days {
                continue;
            }
            if newer.concerned_persons.is_disjoint(&older.concerned_persons) {
                continue;
            }

            let has_intermediate = micro_actions.iter().any(|between| {
                between.actor_id.as_deref() == Some(actor.as_str())
                    && between.recipient_id.as_deref() == Some(recipient.as_str())
                    && between.date_start.is_some_and(|between_start| {
                        older_start < between_start && between_start < newer_start
                    })
                    && !between.concerned_persons.is_disjoint(&newer.concerned_persons)
            });
            if has_intermediate {
                continue;
            }

            edges.push(InferredEdge {
                from: older.id.clone(),
                edge_type: EdgeType::NextInCommunicationChain,
                to: newer.id.clone(),
                days_diff: Some(days_diff),
            });
        }
    }

    edges
}

/// Link a micro-action to an event whose victim it concerns, when their
/// date intervals overlap (a missing end falls back to the start).
pub fn context_links(
    micro_actions: &[MicroActionView],
    events: &[EventView],
) -> Vec<InferredEdge> {
    let mut seen = BTreeSet::new();
    let mut edges = Vec::new();

    for micro in micro_actions {
        let Some(micro_start) = micro.date_start else {
            continue;
        };
        let micro_end = micro.date_end.unwrap_or(micro_start);

        for event in events {
            let Some(event_start) = event.date_start else {
                continue;
            };
            let Some(victim) = &event.victim_id else {
                continue;
            };
            if !micro.concerned_persons.contains(victim) {
                continue;
            }

            let event_end = event.date_end.unwrap_or(event_start);
            if micro_start <= event_end && micro_end >= event_start {
                if seen.insert((micro.id.clone(), event.id.clone())) {
                    edges.push(InferredEdge {
                        from: micro.id.clone(),
                        edge_type: EdgeType::ActedInContextOf,
                        to: event.id.clone(),
                        days_diff: None,
                    });
                }
            }
        }
    }

    edges
}

/// Link each event to its immediate chronological successor for the same
/// victim (no intervening event for that victim).
pub fn case_timeline_links(events: &[EventView]) -> Vec<InferredEdge> {
    let mut edges = Vec::new();

    for earlier in events {
        let (Some(victim), Some(earlier_start)) = (&earlier.victim_id, earlier.date_start) else {
            continue;
        };

        for later in events {
            let Some(later_start) = later.date_start else {
                continue;
            };
            if later.victim_id.as_deref() != Some(victim.as_str()) || earlier.id == later.id {
                continue;
            }
            if earlier_start >= later_start {
                continue;
            }

            let has_intermediate = events.iter().any(|between| {
                between.victim_id.as_deref() == Some(victim.as_str())
                    && between.date_start.is_some_and(|between_start| {
                        earlier_start < between_start && between_start < later_start
                    })
            });
            if has_intermediate {
                continue;
            }

            edges.push(InferredEdge {
                from: earlier.id.clone(),
                edge_type: EdgeType::FollowsInCase,
                to: later.id.clone(),
                days_diff: None,
            });
        }
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn micro(
        id: &str,
        actor: &str,
        recipient: &str,
        start: Option<NaiveDate>,
        concerns: &[&str],
    ) -> MicroActionView {
        MicroActionView {
            id: id.to_string(),
            actor_id: Some(actor.to_string()),
            recipient_id: Some(recipient.to_string()),
            date_start: start,
            concerned_persons: concerns.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }

    fn event(id: &str, victim: &str, start: NaiveDate, end: Option<NaiveDate>) -> EventView {
        EventView {
            id: id.to_string(),
            victim_id: Some(victim.to_string()),
            date_start: Some(start),
            date_end: end,
        }
    }

    #[test]
    fn test_reply_picks_latest_earlier_candidate() {
        let earlier_candidate = micro("c", "x", "y", Some(date(2020, 1, 1)), &["p"]);
        let best_candidate = micro("a", "x", "y", Some(date(2020, 1, 10)), &["p"]);
        let mut reply = micro("b", "y", "x", Some(date(2020, 1, 20)), &["p"]);
        reply.link_type = Some("replies_to".to_string());

        let edges = reply_links(&[earlier_candidate, best_candidate, reply]);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].from, "b");
        assert_eq!(edges[0].to, "a");
        assert_eq!(edges[0].edge_type, EdgeType::RepliesTo);
    }

    #[test]
    fn test_reply_requires_flag_and_dates() {
        let original = micro("a", "x", "y", Some(date(2020, 1, 10)), &[]);
        let mut unflagged = micro("b", "y", "x", Some(date(2020, 1, 20)), &[]);
        unflagged.link_type = Some("forwards".to_string());

        assert!(reply_links(&[original.clone(), unflagged]).is_empty());

        let mut undated = micro("b", "y", "x", None, &[]);
        undated.link_type = Some("acknowledges_receipt".to_string());
        assert!(reply_links(&[original, undated]).is_empty());
    }

    #[test]
    fn test_reply_skips_when_edge_exists() {
        let original = micro("a", "x", "y", Some(date(2020, 1, 10)), &[]);
        let mut reply = micro("b", "y", "x", Some(date(2020, 1, 20)), &[]);
        reply.link_type = Some("replies_to".to_string());
        reply.has_reply_edge = true;

        assert!(reply_links(&[original, reply]).is_empty());
    }

    #[test]
    fn test_reply_ignores_later_and_same_direction_candidates() {
        let later = micro("late", "x", "y", Some(date(2020, 2, 1)), &[]);
        let same_direction = micro("same", "y", "x", Some(date(2020, 1, 5)), &[]);
        let mut reply = micro("b", "y", "x", Some(date(2020, 1, 20)), &[]);
        reply.link_type = Some("replies_to".to_string());

        let edges = reply_links(&[later, same_direction, reply]);
        assert!(edges.is_empty());
    }

    #[test]
    fn test_chain_links_within_window() {
        let older = micro("m1", "x", "y", Some(date(2020, 1, 1)), &["p"]);
        let newer = micro("m2", "x", "y", Some(date(2020, 1, 10)), &["p"]);

        let edges = chain_links(&[older, newer], 14);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].from, "m1");
        assert_eq!(edges[0].to, "m2");
        assert_eq!(edges[0].days_diff, Some(9));
    }

    #[test]
    fn test_chain_respects_window() {
        let older = micro("m1", "x", "y", Some(date(2020, 1, 1)), &["p"]);
        let newer = micro("m2", "x", "y", Some(date(2020, 2, 1)), &["p"]);
        assert!(chain_links(&[older, newer], 14).is_empty());
    }

    #[test]
    fn test_chain_requires_shared_person() {
        let older = micro("m1", "x", "y", Some(date(2020, 1, 1)), &["p"]);
        let newer = micro("m2", "x", "y", Some(date(2020, 1, 10)), &["q"]);
        assert!(chain_links(&[older, newer], 14).is_empty());
    }

    #[test]
    fn test_chain_skips_pair_with_intermediate() {
        let first = micro("m1", "x", "y", Some(date(2020, 1, 1)), &["p"]);
        let middle = micro("m2", "x", "y", Some(date(2020, 1, 5)), &["p"]);
        let last = micro("m3", "x", "y", Some(date(2020, 1, 10)), &["p"]);

        let edges = chain_links(&[first, middle, last], 14);
        let pairs: BTreeSet<(&str, &str)> = edges
            .iter()
            .map(|e| (e.from.as_str(), e.to.as_str()))
            .collect();
        assert!(pairs.contains(&("m1", "m2")));
        assert!(pairs.contains(&("m2", "m3")));
        assert!(!pairs.contains(&("m1", "m3")));
    }

    #[test]
    fn test_context_overlap_with_end_fallback() {
        let micro_view = micro("m", "x", "y", Some(date(1942, 4, 1)), &["p"]);
        let overlapping = event("e1", "p", date(1942, 3, 20), Some(date(1942, 4, 10)));
        let disjoint = event("e2", "p", date(1943, 1, 1), None);
        let other_victim = event("e3", "q", date(1942, 4, 1), None);

        let edges = context_links(&[micro_view], &[overlapping, disjoint, other_victim]);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].from, "m");
        assert_eq!(edges[0].to, "e1");
        assert_eq!(edges[0].edge_type, EdgeType::ActedInContextOf);
    }

    #[test]
    fn test_context_point_in_time_overlap() {
        // end = start on both sides: overlap iff the days coincide.
        let micro_view = micro("m", "x", "y", Some(date(1942, 4, 1)), &["p"]);
        let same_day = event("e", "p", date(1942, 4, 1), None);
        assert_eq!(context_links(&[micro_view.clone()], &[same_day]).len(), 1);

        let other_day = event("e", "p", date(1942, 4, 2), None);
        assert!(context_links(&[micro_view], &[other_day]).is_empty());
    }

    #[test]
    fn test_case_timeline_immediate_successor_only() {
        let first = event("e1", "p", date(1942, 1, 1), None);
        let second = event("e2", "p", date(1942, 2, 1), None);
        let third = event("e3", "p", date(1942, 3, 1), None);
        let unrelated = event("e4", "q", date(1942, 1, 15), None);

        let edges = case_timeline_links(&[first, second, third, unrelated]);
        let pairs: BTreeSet<(&str, &str)> = edges
            .iter()
            .map(|e| (e.from.as_str(), e.to.as_str()))
            .collect();

        assert_eq!(pairs.len(), 2);
        assert!(pairs.contains(&("e1", "e2")));
        assert!(pairs.contains(&("e2", "e3")));
    }

    #[test]
    fn test_rules_are_idempotent_over_unchanged_views() {
        let older = micro("m1", "x", "y", Some(date(2020, 1, 1)), &["p"]);
        let newer = micro("m2", "x", "y", Some(date(2020, 1, 10)), &["p"]);
        let views = [older, newer];

        assert_eq!(chain_links(&views, 14), chain_links(&views, 14));
    }
}
