use anyhow::Result;
use coinop_core::{
    dummy::{DummyEnv, DummyEnvConfig},
    memory::ReplayMemoryConfig,
    processor::VectorProcessor,
    Agent, Trainer, TrainerConfig,
};
use coinop_dqn::{
    dqn::{Dqn, DqnConfig, DqnExplorer, EpsilonGreedy, SyncMode},
    mlp::{Mlp, MlpConfig},
};
use tempdir::TempDir;

const WINDOW_LENGTH: usize = 4;
const OBS_DIM: usize = 2;
const N_ACTIONS: usize = 2;

fn make_agent(seed: u64) -> Dqn<Mlp, coinop_core::processor::VectorFrame> {
    let mlp = Mlp::build(
        &MlpConfig::new(WINDOW_LENGTH * OBS_DIM, 16, N_ACTIONS)
            .learning_rate(0.01)
            .seed(seed),
    );
    Dqn::new(
        mlp,
        DqnConfig::default()
            .batch_size(8)
            .sync(SyncMode::Hard { interval: 4 })
            .explorer(DqnExplorer::EpsilonGreedy(
                EpsilonGreedy::new().anneal_steps(40),
            ))
            .seed(seed),
    )
}

fn make_trainer(max_steps: usize, warmup: usize, interval: usize) -> Trainer<DummyEnv, VectorProcessor> {
    Trainer::build(
        TrainerConfig::default()
            .max_steps(max_steps)
            .warmup_period(warmup)
            .opt_interval(interval),
        DummyEnvConfig::default(),
        ReplayMemoryConfig::default()
            .capacity(100)
            .window_length(WINDOW_LENGTH),
        VectorProcessor::new(OBS_DIM),
    )
}

#[test]
fn full_run_counts_steps_opts_and_episodes() -> Result<()> {
    let mut agent = make_agent(0);
    let summary = make_trainer(50, 20, 4).train(&mut agent, &mut [])?;

    // Warmup covers steps 1..=20; optimization runs at 24, 28, ..., 48.
    assert_eq!(summary.env_steps, 50);
    assert_eq!(summary.opt_steps, 7);
    assert_eq!(summary.episodes, 5);
    assert_eq!(agent.n_opts(), 7);
    Ok(())
}

#[test]
fn target_network_lags_the_online_network_until_a_sync_fires() -> Result<()> {
    let mut agent = make_agent(11);
    let initial = Mlp::build(
        &MlpConfig::new(WINDOW_LENGTH * OBS_DIM, 16, N_ACTIONS)
            .learning_rate(0.01)
            .seed(11),
    );
    // Construction copies the online network exactly.
    assert_eq!(agent.target_network(), &initial);

    // Two opt steps with interval 4: no hard sync has fired, so the target
    // still holds the construction-time parameters.
    make_trainer(28, 20, 4).train(&mut agent, &mut [])?;
    assert_eq!(agent.n_opts(), 2);
    assert_eq!(agent.target_network(), &initial);
    Ok(())
}

#[test]
fn both_networks_survive_a_save_load_round_trip() -> Result<()> {
    let mut agent = make_agent(1);
    // 28 steps with warmup 20 and interval 4 yields exactly 2 optimization
    // steps; later opt steps would desynchronize online and target again.
    make_trainer(28, 20, 4).train(&mut agent, &mut [])?;
    assert_eq!(agent.n_opts(), 2);

    let dir = TempDir::new("dqn")?;
    agent.save_params(dir.path())?;
    // With interval 4 no hard sync has fired after 2 opt steps, so the
    // target still equals the pre-training network, not the online one.
    let online = std::fs::read(dir.path().join("qnet.bin"))?;
    let target = std::fs::read(dir.path().join("qnet_tgt.bin"))?;
    assert_ne!(online, target);

    let mut restored = make_agent(99);
    restored.load_params(dir.path())?;
    let again = TempDir::new("dqn")?;
    restored.save_params(again.path())?;
    assert_eq!(std::fs::read(again.path().join("qnet.bin"))?, online);
    assert_eq!(std::fs::read(again.path().join("qnet_tgt.bin"))?, target);
    Ok(())
}

#[test]
fn soft_sync_keeps_training_running() -> Result<()> {
    let mlp = Mlp::build(&MlpConfig::new(WINDOW_LENGTH * OBS_DIM, 8, N_ACTIONS).seed(3));
    let mut agent = Dqn::new(
        mlp,
        DqnConfig::default()
            .batch_size(4)
            .sync(SyncMode::Soft { tau: 0.1 })
            .seed(3),
    );
    let summary = make_trainer(40, 10, 2).train(&mut agent, &mut [])?;
    assert_eq!(summary.opt_steps, 15);
    Ok(())
}

#[test]
fn evaluation_mode_takes_no_optimization_step() -> Result<()> {
    let mut agent = make_agent(5);
    make_trainer(30, 10, 5).train(&mut agent, &mut [])?;
    let opts_after_training = agent.n_opts();

    agent.eval();
    assert!(!agent.is_train());
    let window = vec![coinop_core::processor::VectorFrame::new(vec![0., 0.]); WINDOW_LENGTH];
    for _ in 0..10 {
        let act = agent.select_action(&window)?;
        assert!(act < N_ACTIONS);
    }
    assert_eq!(agent.n_opts(), opts_after_training);
    Ok(())
}
