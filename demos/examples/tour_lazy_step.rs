// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lazily loaded steps.
//!
//! The second step of this tour is only known once its content has loaded. The tour parks in
//! `Waiting` while the fetch is pending and shows the step once the response has been
//! processed.
//!
//! Run:
//! - `cargo run -p understory_tour_demos --example tour_lazy_step`

use core::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use futures::executor::block_on;
use tracing_subscriber::EnvFilter;
use understory_tour::config::TourConfig;
use understory_tour::hooks::Hook;
use understory_tour::state::{Action, TourState};
use understory_tour::step::{FetchHandle, Step};
use understory_tour::types::TourStatus;
use understory_tour::{Services, Tour, TourError};

fn main() -> Result<(), TourError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Pending requests, completed by the "network" below.
    let requests: Rc<RefCell<VecDeque<FetchHandle>>> = Rc::default();
    let queue = requests.clone();

    let config = TourConfig::new("lazy-demo")
        .step("intro")
        .step(Step::new("report").fetch(move |handle| {
            println!("fetching `{}`", handle.name());
            queue.borrow_mut().push_back(handle);
        }))
        .step("outro");

    let transitions = Rc::new(RefCell::new(Vec::new()));
    let log = transitions.clone();
    let observer = move |action: &Action, state: &TourState| {
        log.borrow_mut().push(format!("{} -> {:?}", action.kind(), state.status()));
    };
    let tour = Tour::with_services(config, Services::new().with_observer(observer))?;

    block_on(async {
        tour.register_step(Step::new("intro").title("Intro")).await?;
        tour.register_step(
            Step::new("outro")
                .title("Done")
                .on_show(Hook::sync(|cx| {
                    println!("showing `{}`", cx.step.as_deref().unwrap_or_default());
                    Ok(())
                })),
        )
        .await?;

        tour.start().await?;
        tour.next().await?;
        assert_eq!(tour.status(), TourStatus::Waiting);
        println!("waiting for {:?}", tour.waiting_for());

        // The response arrives after `next` returned.
        let pending = requests.borrow_mut().pop_front();
        if let Some(handle) = pending {
            handle.resolve(Step::new("").title("Quarterly report"));
        }
        assert_eq!(tour.status(), TourStatus::Waiting, "nothing happens until polled");
        tour.process_pending().await?;
        assert_eq!(tour.status(), TourStatus::On);
        let shown = tour.current_step().and_then(|s| s.title.clone());
        println!("now showing {shown:?}");
        assert_eq!(shown.as_deref(), Some("Quarterly report"));

        // Going back does not fetch again.
        tour.prev().await?;
        tour.next().await?;
        assert!(requests.borrow().is_empty());

        tour.next().await?;
        tour.end().await
    })?;

    for line in transitions.borrow().iter() {
        println!("{line}");
    }
    assert_eq!(tour.status(), TourStatus::Off);
    Ok(())
}
