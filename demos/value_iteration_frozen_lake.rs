use env_logger::Env;
use tabular_rl::{
    algo::{ValueIterationAgent, ValueIterationAgentConfig},
    gym::FrozenLake,
    metrics::CsvSink,
    trainer::{Trainer, TrainerConfig},
};

fn main() -> tabular_rl::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut agent =
        ValueIterationAgent::new(FrozenLake::new(), ValueIterationAgentConfig::default())?;
    let mut test_env = FrozenLake::new();
    let mut sink = CsvSink::from_path("runs/value_iteration.csv")?;

    let trainer = Trainer::new(TrainerConfig::default())?;
    let outcome = trainer.run(&mut agent, &mut test_env, &mut sink)?;
    println!("{:?}", outcome);

    // Greedy action per square, row by row
    let policy = agent.policy();
    for row in 0..4 {
        let line = (0..4)
            .map(|col| format!("{:?}", policy[&(row * 4 + col)]))
            .collect::<Vec<_>>()
            .join("\t");
        println!("{}", line);
    }

    Ok(())
}
