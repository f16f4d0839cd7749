use std::time::{Duration, Instant};

use hc_core::{wait_for_condition, wait_for_state, PollConfig, PollError};

#[test]
fn target_on_mth_call_means_exactly_m_calls() {
    for m in 1..=4u32 {
        let mut calls = 0u32;
        let res: Result<&str, PollError<()>> =
            wait_for_state(PollConfig::new(Duration::from_millis(1), Duration::from_secs(5)),
                           "disk d-1",
                           &["unattached"],
                           || {
                               calls += 1;
                               Ok(if calls == m { "unattached" } else { "creating" })
                           });
        assert_eq!(res, Ok("unattached"));
        assert_eq!(calls, m);
    }
}

#[test]
fn any_of_several_targets_ends_the_wait() {
    let states = ["running", "stopping", "terminated"];
    let mut i = 0;
    let res: Result<&str, PollError<()>> =
        wait_for_state(PollConfig::new(Duration::from_millis(1), Duration::from_secs(5)),
                       "instance i-9",
                       &["stopped", "terminated"],
                       || {
                           let s = states[i];
                           i += 1;
                           Ok(s)
                       });
    assert_eq!(res, Ok("terminated"));
    assert_eq!(i, 3);
}

#[test]
fn never_reaching_target_times_out_after_timeout_and_not_much_later() {
    let timeout = Duration::from_millis(120);
    let started = Instant::now();
    let res: Result<(), PollError<()>> =
        wait_for_condition(PollConfig::new(Duration::from_millis(25), timeout),
                           "console session c-1",
                           "ready",
                           || Ok(None));
    let took = started.elapsed();

    match res {
        Err(PollError::Timeout { resource, desired, elapsed }) => {
            assert_eq!(resource, "console session c-1");
            assert_eq!(desired, "ready");
            assert!(elapsed >= timeout);
        }
        other => panic!("se esperaba timeout, llegó {other:?}"),
    }
    assert!(took >= timeout);
    // una consulta más el margen del scheduler
    assert!(took < timeout + Duration::from_millis(500), "tardó {took:?}");
}

#[test]
fn timeout_message_names_resource_and_state() {
    let err: PollError<String> = PollError::Timeout { resource: "instance i-1".into(),
                                                  desired: "running".into(),
                                                  elapsed: Duration::from_secs(3) };
    assert_eq!(err.to_string(), "timed out after 3s waiting for instance i-1 to be running");
}
