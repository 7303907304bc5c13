use env_logger::Env;
use tabular_rl::{
    algo::{QLearningAgent, QLearningAgentConfig},
    gym::FrozenLake,
    metrics::CsvSink,
    trainer::{Trainer, TrainerConfig},
};

fn main() -> tabular_rl::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut agent = QLearningAgent::new(FrozenLake::new(), QLearningAgentConfig::default())?;
    let mut test_env = FrozenLake::new();
    let mut sink = CsvSink::from_path("runs/q_learning.csv")?;

    let trainer = Trainer::new(TrainerConfig::default())?;
    let outcome = trainer.run(&mut agent, &mut test_env, &mut sink)?;
    println!("{:?}", outcome);

    Ok(())
}
