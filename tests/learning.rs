use std::path::PathBuf;

use backprop_ann::{
    Activation, BackpropOrder, Config, Dataset, Example, LabelEncoding, NearestNeighbour, Network,
    TrainConfig, report,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Two well-separated clusters of `per_class` points each.
fn separable(per_class: usize, seed: u64) -> Vec<Example> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut examples = Vec::with_capacity(2 * per_class);
    for _ in 0..per_class {
        examples.push(Example::new(
            vec![rng.gen_range(0.0..0.35), rng.gen_range(0.0..0.35)],
            1,
        ));
        examples.push(Example::new(
            vec![rng.gen_range(0.65..1.0), rng.gen_range(0.65..1.0)],
            2,
        ));
    }
    examples
}

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "backprop-ann-{}-{name}",
        std::process::id()
    ));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn learns_a_linearly_separable_toy_set() {
    let mut examples = separable(20, 3);
    let mut net = Network::new(2, 3, 2).unwrap();
    net.init_weights_with_seed(-1.0, 1.0, 7).unwrap();

    let cfg = TrainConfig {
        num_epochs: 500,
        learning_rate: 0.1,
        momentum: 0.05,
        max_error: -1.0,
        ..TrainConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(7);
    let report = net.train(&mut examples, &cfg, &mut rng).unwrap();

    assert_eq!(report.epochs.len(), 500);
    let last = report.last().unwrap();
    assert!(
        last.hit_percentage >= 90.0,
        "final training hit rate {}",
        last.hit_percentage
    );
    assert!(last.network_error < report.epochs[0].network_error);

    let test = net
        .test(&examples, Activation::Logistic, Activation::Logistic)
        .unwrap();
    assert!(test.hit_percentage >= 90.0, "test hit rate {}", test.hit_percentage);
}

#[test]
fn textbook_order_also_learns() {
    let mut examples = separable(20, 4);
    let mut net = Network::new(2, 3, 2).unwrap();
    net.init_weights_with_seed(-1.0, 1.0, 9).unwrap();

    let cfg = TrainConfig {
        num_epochs: 500,
        max_error: -1.0,
        backprop_order: BackpropOrder::AttributeThenAdjust,
        ..TrainConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(9);
    net.train(&mut examples, &cfg, &mut rng).unwrap();

    let test = net
        .test(&examples, Activation::Logistic, Activation::Logistic)
        .unwrap();
    assert!(test.hit_percentage >= 90.0, "test hit rate {}", test.hit_percentage);
}

#[test]
fn early_stop_ends_training_once_error_is_small_enough() {
    let mut examples = separable(20, 5);
    let mut net = Network::new(2, 3, 2).unwrap();
    net.init_weights_with_seed(-1.0, 1.0, 5).unwrap();

    let cfg = TrainConfig {
        num_epochs: 20_000,
        learning_rate: 0.5,
        max_error: 0.05,
        ..TrainConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(5);
    let report = net.train(&mut examples, &cfg, &mut rng).unwrap();

    assert!(report.stopped_early);
    assert!(report.epochs.len() > 1);
    assert!(report.epochs.len() < 20_000);
    assert!(report.last().unwrap().network_error <= 0.05);
    assert_eq!(net.epochs_run(), report.epochs.len());
}

#[test]
fn file_driven_run_matches_the_command_line_pipeline() {
    let mut data = String::from("# x y class\n");
    for example in separable(30, 11) {
        // Scale up so normalization has work to do.
        data.push_str(&format!(
            "{}\t{}\t{}\n",
            example.attributes[0] * 50.0,
            example.attributes[1] * 50.0 + 10.0,
            example.class
        ));
    }
    let data_path = temp_file("toy.dat", &data);
    let config_path = temp_file(
        "toy.json",
        r#"{"num_inputs": 2, "num_hidden": 4, "num_outputs": 2,
            "learning_rate": 0.2, "num_epochs": 2000, "max_error": 0.2,
            "training_ratio": 70, "seed": 21}"#,
    );

    let cfg = Config::load(&config_path).unwrap();
    let mut dataset = Dataset::load(
        &data_path,
        cfg.num_inputs,
        cfg.num_outputs,
        cfg.label_encoding,
    )
    .unwrap();
    dataset.normalize();
    assert!(
        dataset
            .examples()
            .iter()
            .flat_map(|e| e.attributes.iter())
            .all(|&x| (0.0..=1.0).contains(&x))
    );

    let mut rng = StdRng::seed_from_u64(cfg.seed.unwrap());
    let (training, testing) = dataset.stratified_split(cfg.training_ratio, &mut rng).unwrap();
    assert_eq!(training.len(), 42);
    assert_eq!(testing.len(), 18);
    assert_eq!(training.class_counts(), vec![21, 21]);

    let mut net = cfg.build_network(&mut rng).unwrap();
    let train_cfg = cfg.train_config();
    let mut examples = training.into_examples();
    net.train(&mut examples, &train_cfg, &mut rng).unwrap();
    let test = net
        .test(
            testing.examples(),
            train_cfg.hidden_activation,
            train_cfg.output_activation,
        )
        .unwrap();
    assert!(test.hit_percentage >= 90.0, "test hit rate {}", test.hit_percentage);

    let knn = NearestNeighbour::new(3).unwrap();
    let knn_report = knn.evaluate(&examples, testing.examples()).unwrap();
    assert_eq!(knn_report.hit_percentage, 100.0);

    let plot_path = temp_file("error.dat", "");
    report::save_plot_data(&plot_path, net.error_history()).unwrap();
    let plot = std::fs::read_to_string(&plot_path).unwrap();
    assert_eq!(plot.lines().count(), net.epochs_run());
    assert!(plot.starts_with("\t1\t\t"));

    for path in [data_path, config_path, plot_path] {
        std::fs::remove_file(path).ok();
    }
}

#[test]
fn one_hot_files_load_like_integer_files() {
    let integer = temp_file("int.dat", "0.1 0.2 1\n0.9 0.8 3\n0.5 0.5 2\n");
    let one_hot = temp_file("onehot.dat", "0.1 0.2 1 0 0\n0.9 0.8 0 0 1\n0.5 0.5 0 1 0\n");

    let a = Dataset::load(&integer, 2, 3, LabelEncoding::Integer).unwrap();
    let b = Dataset::load(&one_hot, 2, 3, LabelEncoding::OneHot).unwrap();
    assert_eq!(a, b);

    std::fs::remove_file(integer).ok();
    std::fs::remove_file(one_hot).ok();
}
