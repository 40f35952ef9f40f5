use std::sync::Once;

use relay_core::{RunStage, StageContext};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(relay_logging::initialize_for_tests);
}

#[test]
fn empty_staging_with_source_fetches_first() {
    init_logging();
    let ctx = StageContext {
        staging_empty: true,
        source_configured: true,
    };
    assert_eq!(RunStage::Idle.advance(&ctx), RunStage::Fetching);
}

#[test]
fn leftover_staging_skips_straight_to_publishing() {
    init_logging();
    let ctx = StageContext {
        staging_empty: false,
        source_configured: true,
    };
    assert_eq!(RunStage::Idle.advance(&ctx), RunStage::Publishing);
}

#[test]
fn missing_source_url_skips_fetching() {
    init_logging();
    let ctx = StageContext {
        staging_empty: true,
        source_configured: false,
    };
    assert_eq!(RunStage::Idle.advance(&ctx), RunStage::Publishing);
}

#[test]
fn stages_run_to_done_and_stay_there() {
    init_logging();
    let ctx = StageContext {
        staging_empty: true,
        source_configured: true,
    };
    let mut stage = RunStage::Idle;
    let mut order = vec![stage];
    while !stage.is_terminal() {
        stage = stage.advance(&ctx);
        order.push(stage);
    }
    assert_eq!(
        order,
        vec![
            RunStage::Idle,
            RunStage::Fetching,
            RunStage::Publishing,
            RunStage::Finalizing,
            RunStage::Done,
        ]
    );
    assert_eq!(RunStage::Done.advance(&ctx), RunStage::Done);
}
