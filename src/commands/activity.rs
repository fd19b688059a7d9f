//! Handler for `mmt activity`.
//!
//! The feed runs on its real timer. Each step waits for the next published order, or for one
//! period while hovered since nothing is published then.

use crate::activity::FeedState;
use crate::api::Mode;
use crate::args::ActivityArgs;
use crate::commands::{describe, open_tracker, Out, Row};
use crate::feed::ActivityFeed;
use crate::model::{ActivityKey, Record};
use crate::{Config, Result};
use anyhow::Context;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;
use tracing::debug;

/// The activity list as it looked after `step` steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityFrame {
    pub step: u32,
    pub state: FeedState,
    pub order: Vec<ActivityKey>,
}

/// Handles `mmt activity`.
pub async fn activity(
    config: Config,
    mode: Mode,
    args: &ActivityArgs,
) -> Result<Out<Vec<ActivityFrame>>> {
    let mut tracker = open_tracker(&config, mode, args.period()).await?;
    tracker.refresh_activity().await;
    let currency = tracker.currency();
    let rows: BTreeMap<ActivityKey, Row> = tracker
        .recent_activity()
        .into_iter()
        .map(|a| (a.key(), Row::activity(a, currency)))
        .collect();

    let mut feed = ActivityFeed::start(tracker.activity_keys(), config.cycle_period());
    feed.sync(tracker.activity_keys(), tracker.activity_source());
    let mut orders = feed.subscribe();
    let mut frames = vec![ActivityFrame {
        step: 0,
        state: feed.state(),
        order: orders.borrow_and_update().clone(),
    }];

    for step in 1..=args.ticks() {
        if args.hover_at() == Some(step - 1) {
            debug!("Hovering over the activity list");
            feed.hover_enter();
            orders.borrow_and_update();
        }
        match feed.state() {
            FeedState::Cycling => orders
                .changed()
                .await
                .context("The activity feed stopped publishing")?,
            FeedState::Static => tokio::time::sleep(feed.period()).await,
        }
        frames.push(ActivityFrame {
            step,
            state: feed.state(),
            order: orders.borrow_and_update().clone(),
        });
    }

    let mut message = format!("Recent activity for {}\n", describe(tracker.period()));
    if rows.is_empty() {
        message.push_str("  (none)\n");
    }
    for frame in &frames {
        let _ = writeln!(message, "\nStep {} ({})", frame.step, frame.state);
        for key in &frame.order {
            if let Some(row) = rows.get(key) {
                let _ = writeln!(
                    message,
                    "  {:<13} {:<24} {:>12}",
                    row.date, row.label, row.amount
                );
            }
        }
    }
    Ok(Out::new(message, frames))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::PeriodArgs;
    use crate::model::{ActivityKind, RecordId};
    use crate::test::TestEnv;

    fn key(id: u64, kind: ActivityKind) -> ActivityKey {
        ActivityKey {
            id: RecordId::new(id),
            kind,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_cycles_then_holds() {
        let env = TestEnv::new().await;
        let args = ActivityArgs::new(PeriodArgs::new(Some(10), Some(2026), None), 5, Some(3));
        let out = activity(env.config(), env.mode(), &args).await.unwrap();
        let frames = out.structure().unwrap();
        assert_eq!(frames.len(), 6);

        let a = key(6, ActivityKind::Expense);
        let b = key(102, ActivityKind::Income);
        let c = key(5, ActivityKind::Expense);
        let orders: Vec<&[ActivityKey]> = frames.iter().map(|f| f.order.as_slice()).collect();
        assert_eq!(orders[0], &[a, b, c]);
        assert_eq!(orders[1], &[c, a, b]);
        assert_eq!(orders[2], &[b, c, a]);
        assert_eq!(orders[3], &[a, c, b]);
        // Hovered from here on: the baseline is shown and held.
        assert_eq!(orders[4], &[a, b, c]);
        assert_eq!(orders[5], &[a, b, c]);
        assert_eq!(frames[3].state, FeedState::Cycling);
        assert_eq!(frames[5].state, FeedState::Static);
        assert!(out.message().contains("Groceries (expense)"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_empty_period() {
        let env = TestEnv::new().await;
        let args = ActivityArgs::new(PeriodArgs::new(Some(1), Some(2020), None), 2, None);
        let out = activity(env.config(), env.mode(), &args).await.unwrap();
        let frames = out.structure().unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| f.order.is_empty()));
        assert!(out.message().contains("(none)"));
    }
}
