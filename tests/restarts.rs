use evo_core::canonical::Canonical;
use evo_core::error::EvoError;
use evo_core::nes::Natural;
use evo_core::optimizer::{Optimizer, Runner, Standalone, Task};
use evo_core::restart::{
    PopulationResize, RestartWrapper, SigmaCriterion, MIN_NUM_GENS, RESTARTED, RESTART_COUNTER,
};
use evo_core::sampler::SeedStream;
use evo_core::strategy::{Strategy, BEST_FITNESS, GEN_COUNTER, POPSIZE};
use evo_problems::ClassicFitness;

#[test]
fn ipop_on_rastrigin() {
    let task = ClassicFitness::new("rastrigin", 2).unwrap();
    let opt = RestartWrapper::with_policy(Natural::new(2, 8).unwrap(), PopulationResize)
        .with_criterion(SigmaCriterion);
    let params = opt
        .default_params()
        .with(MIN_NUM_GENS, 10usize)
        .with("min_sigma", 0.05f32)
        .with("sigma_init", 0.5f32)
        .with("sigma_decay", 0.8f32)
        .with("sigma_limit", 1e-3f32)
        .with("init_min", -5.12f32)
        .with("init_max", 5.12f32);

    let mut seeds = SeedStream::new(11);
    let mut state = opt.initialize(seeds.next_seed(), &params).unwrap();
    let mut restarts = 0;
    for _ in 0..60 {
        let before = state.clone();
        let (x, asked) = opt.ask(seeds.next_seed(), state, &params).unwrap();
        assert_eq!(x.len(), before.get_usize(POPSIZE).unwrap());

        let rollout = task.rollout(seeds.next_seed(), &x).unwrap();
        state = opt
            .tell(seeds.next_seed(), &x, &rollout.function_value, asked, &params)
            .unwrap();

        assert!(state.get_f32(BEST_FITNESS).unwrap() <= before.get_f32(BEST_FITNESS).unwrap());
        let counter = state.get_usize(RESTART_COUNTER).unwrap();
        if state.get_bool(RESTARTED).unwrap() {
            restarts += 1;
            assert_eq!(counter, before.get_usize(RESTART_COUNTER).unwrap() + 1);
            assert_eq!(state.get_usize(GEN_COUNTER).unwrap(), 0);
            assert_eq!(
                state.get_usize(POPSIZE).unwrap(),
                2 * before.get_usize(POPSIZE).unwrap()
            );
        } else {
            assert_eq!(counter, before.get_usize(RESTART_COUNTER).unwrap());
        }
    }
    assert!(restarts >= 2);
    assert_eq!(state.get_usize(RESTART_COUNTER).unwrap(), restarts);
}

#[test]
fn bare_controller_cannot_restart() {
    let task = ClassicFitness::new("quadratic", 3).unwrap();
    let opt = RestartWrapper::new(Canonical::new(3, 4).unwrap());
    let params = opt.default_params();
    let state = opt.initialize(0, &params).unwrap();
    let (x, asked) = opt.ask(1, state, &params).unwrap();
    let rollout = task.rollout(2, &x).unwrap();
    assert_eq!(
        opt.tell(3, &x, &rollout.function_value, asked, &params)
            .unwrap_err(),
        EvoError::NotImplemented
    );
}

#[test]
fn wrapper_requires_its_parameters() {
    let opt = RestartWrapper::new(Canonical::new(2, 4).unwrap()).with_criterion(SigmaCriterion);
    // base defaults plus the guard, but no criterion threshold
    let params = opt.base().default_params().with(MIN_NUM_GENS, 5usize);
    match opt.initialize(0, &params) {
        Err(EvoError::MissingParameter(key)) => assert_eq!(key, "min_sigma"),
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn runner_reaches_himmelblau_minimum() {
    let task = ClassicFitness::new("himmelblau", 2).unwrap();
    let opt = Standalone(Canonical::new(2, 16).unwrap());
    let params = opt.default_params().with("sigma_decay", 0.95f32);
    let runner = Runner {
        generations: 150,
        report_iter: 0,
        seed: 5,
    };
    let summary = runner.run(&opt, &task, &params).unwrap();
    assert!(summary.best_fitness < 1e-2);
}
