use backprop_ann::{Dataset, Example, NearestNeighbour, Network, TrainConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() -> backprop_ann::Result<()> {
    // Three noisy classes along a line, on a wide raw scale.
    let mut rng = StdRng::seed_from_u64(1);
    let mut examples = Vec::new();
    for class in 1..=3 {
        let centre = class as f64 * 100.0;
        for _ in 0..40 {
            examples.push(Example::new(
                vec![
                    centre + rng.gen_range(-30.0..30.0),
                    rng.gen_range(0.0..5.0),
                    centre * 0.5 + rng.gen_range(-20.0..20.0),
                ],
                class,
            ));
        }
    }

    let mut dataset = Dataset::from_examples(examples, 3, 3)?;
    dataset.normalize();
    let (training, testing) = dataset.stratified_split(75, &mut rng)?;
    println!("training={} testing={}", training.len(), testing.len());

    let mut net = Network::new(3, 6, 3)?;
    net.init_weights(3, 6, -1.0, 1.0, &mut rng)?;
    let cfg = TrainConfig {
        num_epochs: 1_000,
        learning_rate: 0.3,
        ..TrainConfig::default()
    };
    let mut train_set = training.examples().to_vec();
    let report = net.train(&mut train_set, &cfg, &mut rng)?;
    let ann = net.test(testing.examples(), cfg.hidden_activation, cfg.output_activation)?;
    println!(
        "ann: epochs={} hits={}/{} ({:.1}%)",
        report.epochs.len(),
        ann.hits,
        ann.total,
        ann.hit_percentage
    );

    for k in [1, 3, 7] {
        let knn = NearestNeighbour::new(k)?.evaluate(training.examples(), testing.examples())?;
        println!(
            "knn k={k}: hits={}/{} ({:.1}%)",
            knn.hits, knn.total, knn.hit_percentage
        );
    }

    Ok(())
}
