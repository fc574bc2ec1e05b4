use chrono::{DateTime, Duration, Utc};

use super::summary;
use super::types::{DirectionGroup, MatchedRecord, OverpassResult, PassOutcome, Undetermined};
use crate::plan::Grouping;

/// Per-satellite inputs of the selection besides the matched records.
#[derive(Debug, Clone)]
pub struct SelectionContext<'a> {
    pub satellite: &'a str,
    pub grouping: Grouping,
    pub reference: DateTime<Utc>,
    pub horizon: Option<DateTime<Utc>>,
    pub repeat_cycle: Duration,
    /// Upcoming passes kept per group, at least one.
    pub max_passes: usize,
}

/// Pick the earliest match of every direction group. Ties on the start are broken by the
/// earlier end, then by input order. Empty groups are reported as undetermined.
pub fn select(ctx: &SelectionContext<'_>, mut matched: Vec<MatchedRecord>) -> OverpassResult {
    // Stable sort: equal keys keep their input order.
    matched.sort_by_key(|m| (m.record.window_start, m.record.window_end));

    let keep = ctx.max_passes.max(1);
    let mut groups = Vec::new();
    let mut lines = Vec::new();
    let mut footprints = Vec::new();

    for &direction in ctx.grouping.directions() {
        let upcoming: Vec<MatchedRecord> = matched
            .iter()
            .filter(|m| ctx.grouping.contains(direction, m.record.direction))
            .take(keep)
            .cloned()
            .collect();

        let outcome = match upcoming.first() {
            Some(first) => {
                lines.push(summary::pass_line(ctx.satellite, direction, first));
                footprints.push(Some(first.record.footprint.clone()));
                PassOutcome::Next(first.clone())
            }
            None => {
                let undetermined = undetermined(ctx);
                log::debug!(
                    "{} {}: no match, {:?}",
                    ctx.satellite,
                    direction,
                    undetermined
                );
                lines.push(summary::undetermined_line(ctx.satellite, direction, &undetermined));
                footprints.push(None);
                PassOutcome::Undetermined(undetermined)
            }
        };

        groups.push(DirectionGroup {
            direction,
            outcome,
            upcoming,
        });
    }

    OverpassResult {
        satellite: ctx.satellite.to_string(),
        reference: ctx.reference,
        horizon: ctx.horizon,
        groups,
        summary: lines,
        footprints,
    }
}

/// A plan that reaches a full repeat cycle past the reference would have shown any pass
/// over the AOI; a shorter one cannot rule it out.
fn undetermined(ctx: &SelectionContext<'_>) -> Undetermined {
    match ctx.horizon {
        Some(horizon) if ctx.reference + ctx.repeat_cycle <= horizon => {
            Undetermined::NoIntersection { horizon }
        }
        horizon => Undetermined::HorizonExceeded { horizon },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{OrbitalDirection, PassMetadata, PlanRecord};
    use chrono::TimeZone;
    use geo::{polygon, MultiPolygon};

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn ctx(grouping: Grouping, horizon: Option<DateTime<Utc>>) -> SelectionContext<'static> {
        SelectionContext {
            satellite: "Sat",
            grouping,
            reference: reference(),
            horizon,
            repeat_cycle: Duration::days(12),
            max_passes: 5,
        }
    }

    fn matched(
        direction: OrbitalDirection,
        start_h: i64,
        end_h: i64,
        tag: u16,
    ) -> MatchedRecord {
        MatchedRecord {
            record: PlanRecord {
                satellite: "Sat".into(),
                direction,
                footprint: MultiPolygon::new(vec![polygon![
                    (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0),
                ]]),
                window_start: reference() + Duration::hours(start_h),
                window_end: reference() + Duration::hours(end_h),
                metadata: PassMetadata::Landsat { path: tag, row: 1 },
            },
            aoi_overlap_pct: 100.0,
        }
    }

    fn tag(m: &MatchedRecord) -> u16 {
        match m.record.metadata {
            PassMetadata::Landsat { path, .. } => path,
            _ => 0,
        }
    }

    #[test]
    fn earliest_start_then_earliest_end_then_input_order() {
        let d = OrbitalDirection::Unspecified;
        let records = vec![
            matched(d, 10, 12, 1),
            matched(d, 5, 9, 2),
            matched(d, 5, 7, 3),
            matched(d, 5, 7, 4),
        ];
        let result = select(&ctx(Grouping::Single, None), records);
        let next = result.next_pass(OrbitalDirection::Unspecified).unwrap();
        assert_eq!(tag(next), 3);

        let order: Vec<u16> = result.groups[0].upcoming.iter().map(tag).collect();
        assert_eq!(order, vec![3, 4, 2, 1]);
    }

    #[test]
    fn directions_are_selected_independently() {
        let records = vec![
            matched(OrbitalDirection::Descending, 30, 30, 1),
            matched(OrbitalDirection::Ascending, 40, 40, 2),
            matched(OrbitalDirection::Descending, 20, 20, 3),
        ];
        let result = select(&ctx(Grouping::ByDirection, None), records);
        assert_eq!(result.groups.len(), 2);
        assert_eq!(result.groups[0].direction, OrbitalDirection::Ascending);
        assert_eq!(tag(result.next_pass(OrbitalDirection::Ascending).unwrap()), 2);
        assert_eq!(tag(result.next_pass(OrbitalDirection::Descending).unwrap()), 3);
        assert_eq!(result.summary.len(), 2);
        assert!(result.footprints.iter().all(Option::is_some));
    }

    #[test]
    fn empty_group_is_explicitly_undetermined() {
        let records = vec![matched(OrbitalDirection::Descending, 1, 1, 1)];
        let horizon = reference() + Duration::days(3);
        let result = select(&ctx(Grouping::ByDirection, Some(horizon)), records);

        assert_eq!(
            result.groups[0].outcome,
            PassOutcome::Undetermined(Undetermined::HorizonExceeded {
                horizon: Some(horizon)
            })
        );
        assert!(result.summary[0].contains("no qualifying pass found within horizon"));
        assert_eq!(result.footprints[0], None);
        assert!(result.footprints[1].is_some());
        assert!(!result.is_undetermined());
    }

    #[test]
    fn long_plan_without_match_is_no_intersection() {
        let horizon = reference() + Duration::days(30);
        let result = select(&ctx(Grouping::Single, Some(horizon)), vec![]);
        assert_eq!(
            result.groups[0].outcome,
            PassOutcome::Undetermined(Undetermined::NoIntersection { horizon })
        );
        assert!(result.is_undetermined());

        let result = select(&ctx(Grouping::Single, None), vec![]);
        assert_eq!(
            result.groups[0].outcome,
            PassOutcome::Undetermined(Undetermined::HorizonExceeded { horizon: None })
        );
    }

    #[test]
    fn upcoming_is_capped() {
        let d = OrbitalDirection::Unspecified;
        let records = (0..10).map(|i| matched(d, i, i, i as u16)).collect();
        let mut context = ctx(Grouping::Single, None);
        context.max_passes = 3;
        let result = select(&context, records);
        assert_eq!(result.groups[0].upcoming.len(), 3);
    }
}
