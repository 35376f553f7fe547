// SPDX-License-Identifier: MPL-2.0

mod common;

use std::{
    thread,
    time::{Duration, Instant},
};

use common::{Trace, config, kernel, run};
use ppos::{
    Kernel,
    task::{TaskClass, TaskId, TaskOptions, TaskStatus},
};

/// Returns how many times the running task has been switched in.
fn activations(kernel: &Kernel) -> u64 {
    kernel.current().unwrap().activations
}

#[test]
fn quantum_expires_on_twentieth_tick() {
    let kernel = kernel();
    assert_eq!(kernel.config().get_quantum(), 20);
    let seen = Trace::new();

    let k = kernel.clone();
    let s = seen.clone();
    let task = kernel
        .create(TaskOptions::new(move || {
            for tick in 1..=20 {
                k.timer_interrupt();
                s.push((tick, activations(&k)));
            }
            k.exit(0)
        }))
        .unwrap();

    let before = kernel.jiffies();
    run(&kernel);

    let events = seen.events();
    // The task is the only candidate, so it is picked again right away.
    assert!(events[..19].iter().all(|&(_, n)| n == 1));
    assert_eq!(events[19], (20, 2));

    let stats = kernel.stats(task).unwrap();
    assert_eq!(stats.cpu_ticks, 20);
    assert_eq!(stats.activations, 2);
    assert_eq!(kernel.jiffies().as_u64() - before.as_u64(), 20);
}

#[test]
fn preempted_task_goes_to_the_tail() {
    let kernel = ppos::init(config().quantum(3)).unwrap();
    let order = Trace::new();

    for name in ["hog", "polite"] {
        let k = kernel.clone();
        let order = order.clone();
        let options = TaskOptions::new(move || {
            order.push(name);
            if name == "hog" {
                for _ in 0..3 {
                    k.timer_interrupt();
                }
                order.push(name);
            }
            k.exit(0)
        })
        .name(name);
        kernel.create(options).unwrap();
    }

    run(&kernel);
    assert_eq!(order.events(), ["hog", "polite", "hog"]);
}

#[test]
fn system_tasks_are_never_preempted() {
    let kernel = kernel();
    let seen = Trace::new();

    let k = kernel.clone();
    let s = seen.clone();
    let system = kernel
        .create(
            TaskOptions::new(move || {
                for _ in 0..50 {
                    k.timer_interrupt();
                }
                s.push(activations(&k));
                k.switch_to(TaskId::MAIN).unwrap();
            })
            .class(TaskClass::System),
        )
        .unwrap();

    kernel.switch_to(system).unwrap();
    assert_eq!(seen.events(), [1]);
    assert_eq!(kernel.stats(system).unwrap().cpu_ticks, 50);

    // Ticks delivered to the main task are charged to it alone.
    kernel.timer_interrupt();
    assert_eq!(kernel.stats(TaskId::MAIN).unwrap().cpu_ticks, 1);
    assert_eq!(kernel.id(), TaskId::MAIN);
}

#[test]
fn disabled_preemption_defers_the_switch() {
    let kernel = kernel();
    let seen = Trace::new();

    let k = kernel.clone();
    let s = seen.clone();
    let task = kernel
        .create(TaskOptions::new(move || {
            let guard = k.disable_preempt();
            for _ in 0..25 {
                k.timer_interrupt();
            }
            s.push(("guarded", activations(&k)));
            drop(guard);

            s.push(("released", activations(&k)));
            k.might_preempt();
            s.push(("preempted", activations(&k)));
            k.exit(0)
        }))
        .unwrap();

    run(&kernel);

    assert_eq!(
        seen.events(),
        [("guarded", 1), ("released", 1), ("preempted", 2)]
    );
    assert_eq!(kernel.stats(task).unwrap().cpu_ticks, 25);
}

#[test]
fn switching_with_preemption_disabled_panics() {
    let kernel = kernel();

    let k = kernel.clone();
    let task = kernel
        .create(TaskOptions::new(move || {
            let _guard = k.disable_preempt();
            let _ = k.yield_now();
        }))
        .unwrap();

    run(&kernel);

    let stats = kernel.stats(task).unwrap();
    assert_eq!(stats.status, TaskStatus::Terminated);
    assert_eq!(stats.exit_code, Some(-1));
    assert_eq!(stats.activations, 1);
}

#[test]
fn ticker_preempts_busy_task() {
    let kernel = ppos::init(config().quantum(5).tick_interval(Duration::from_millis(1))).unwrap();
    let seen = Trace::new();

    let k = kernel.clone();
    let s = seen.clone();
    kernel
        .create(TaskOptions::new(move || {
            let deadline = Instant::now() + Duration::from_secs(10);
            while activations(&k) == 1 && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(1));
                k.might_preempt();
            }
            s.push(activations(&k));
            k.exit(0)
        }))
        .unwrap();

    let ticker = kernel.start_ticker().unwrap();
    run(&kernel);
    ticker.stop();

    assert_eq!(seen.events(), [2]);
    assert!(kernel.jiffies().as_u64() >= 5);
}

#[test]
fn ticker_charges_the_running_task() {
    let kernel = ppos::init(config().quantum(5).tick_interval(Duration::from_millis(1))).unwrap();
    let seen = Trace::new();

    let k = kernel.clone();
    let s = seen.clone();
    let sleeper = kernel
        .create(
            TaskOptions::new(move || {
                // Runs past its quantum without reaching a preemption point.
                thread::sleep(Duration::from_millis(30));
                s.push(("sleeper", k.current().unwrap().cpu_ticks, 1));
                k.exit(0)
            })
            .priority(-5),
        )
        .unwrap();

    let k = kernel.clone();
    let s = seen.clone();
    let next = kernel
        .create(
            TaskOptions::new(move || {
                let ticks = k.current().unwrap().cpu_ticks;
                k.might_preempt();
                s.push(("next", ticks, activations(&k)));
                k.exit(0)
            })
            .priority(5),
        )
        .unwrap();

    let ticker = kernel.start_ticker().unwrap();
    run(&kernel);
    ticker.stop();

    let events = seen.events();
    assert_eq!(events.len(), 2);
    let (_, slept, _) = events[0];
    let (_, inherited, entered) = events[1];
    assert!(slept >= 5, "sleeper was charged {} ticks", slept);
    // The quantum exhausted by the sleeper is not carried over.
    assert!(inherited < 5, "next task started with {} ticks", inherited);
    assert_eq!(entered, 1);

    let charged = kernel.stats(sleeper).unwrap().cpu_ticks + kernel.stats(next).unwrap().cpu_ticks;
    assert!(kernel.jiffies().as_u64() >= charged);
}
