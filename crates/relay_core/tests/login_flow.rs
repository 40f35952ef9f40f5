use std::sync::Once;
use std::time::Duration;

use relay_core::{LoginEvent, LoginFlow, LoginState, WaitVerdict};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(relay_logging::initialize_for_tests);
}

#[test]
fn already_logged_in_page_short_circuits() {
    init_logging();
    let mut flow = LoginFlow::new(Duration::from_secs(300));
    let verdict = flow.observe(LoginEvent::PageReady { logged_in: true });
    assert_eq!(verdict, WaitVerdict::LoggedIn);
    assert_eq!(flow.state(), LoginState::LoggedIn);
}

#[test]
fn submission_enters_bounded_wait() {
    init_logging();
    let mut flow = LoginFlow::new(Duration::from_secs(300));
    assert_eq!(
        flow.observe(LoginEvent::PageReady { logged_in: false }),
        WaitVerdict::Pending
    );
    assert_eq!(flow.state(), LoginState::NeedsLogin);

    assert_eq!(
        flow.observe(LoginEvent::CredentialsSubmitted),
        WaitVerdict::Pending
    );
    assert_eq!(
        flow.state(),
        LoginState::AwaitingCompletion {
            waited: Duration::ZERO
        }
    );
}

#[test]
fn poll_tracks_elapsed_time_until_login() {
    init_logging();
    let mut flow = LoginFlow::new(Duration::from_secs(300));
    flow.observe(LoginEvent::CredentialsSubmitted);

    let verdict = flow.observe(LoginEvent::Poll {
        elapsed: Duration::from_secs(10),
        logged_in: false,
    });
    assert_eq!(verdict, WaitVerdict::Pending);
    assert_eq!(
        flow.state(),
        LoginState::AwaitingCompletion {
            waited: Duration::from_secs(10)
        }
    );

    let verdict = flow.observe(LoginEvent::Poll {
        elapsed: Duration::from_secs(20),
        logged_in: true,
    });
    assert_eq!(verdict, WaitVerdict::LoggedIn);
    assert_eq!(flow.state(), LoginState::LoggedIn);
}

#[test]
fn budget_exhaustion_times_out() {
    init_logging();
    let mut flow = LoginFlow::new(Duration::from_secs(60));
    flow.observe(LoginEvent::CredentialsSubmitted);

    let verdict = flow.observe(LoginEvent::Poll {
        elapsed: Duration::from_secs(60),
        logged_in: false,
    });
    assert_eq!(verdict, WaitVerdict::TimedOut);
}

#[test]
fn cancel_is_an_explicit_outcome() {
    init_logging();
    let mut flow = LoginFlow::new(Duration::from_secs(60));
    flow.observe(LoginEvent::CredentialsSubmitted);
    assert_eq!(flow.observe(LoginEvent::Cancel), WaitVerdict::Cancelled);
}
