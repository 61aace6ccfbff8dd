use backprop_ann::{Activation, Example, Network, TrainConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() -> backprop_ann::Result<()> {
    // Two clusters, one per corner of the unit square.
    let mut rng = StdRng::seed_from_u64(0);
    let mut examples = Vec::new();
    for _ in 0..20 {
        examples.push(Example::new(
            vec![rng.gen_range(0.0..0.4), rng.gen_range(0.0..0.4)],
            1,
        ));
        examples.push(Example::new(
            vec![rng.gen_range(0.6..1.0), rng.gen_range(0.6..1.0)],
            2,
        ));
    }

    // 2 -> 3 -> 2 network, tanh hidden units.
    let mut net = Network::new(2, 3, 2)?;
    net.init_weights(2, 3, -1.0, 1.0, &mut rng)?;

    let cfg = TrainConfig {
        num_epochs: 500,
        hidden_activation: Activation::Tanh,
        ..TrainConfig::default()
    };
    let mut log_every = |r: &backprop_ann::EpochReport| {
        if r.epoch % 50 == 0 {
            println!(
                "epoch={} error={:.5} hits={:.1}%",
                r.epoch, r.network_error, r.hit_percentage
            );
        }
    };
    let report = net.train_with_sink(&mut examples, &cfg, &mut rng, &mut log_every)?;
    println!(
        "epochs={} stopped_early={}",
        report.epochs.len(),
        report.stopped_early
    );

    for x in [[0.1, 0.1], [0.9, 0.9], [0.3, 0.7]] {
        net.set_inputs(&x)?;
        net.forward(cfg.hidden_activation, cfg.output_activation)?;
        println!("x={x:?} class={}", net.predicted_class());
    }

    Ok(())
}
