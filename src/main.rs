//! Ranch Layout CLI - Run a layout search from JSON configuration.

use std::fs;
use std::path::PathBuf;

use ranch_layout::{
    compute::evolution::{
        Assessment, EvolutionEngine, OptimizationResult, PopulationSnapshot, RunRecord,
    },
    schema::{Catalogs, EvolutionProgress, MaterialCatalog, OptimizerConfig},
};

struct Options {
    config_path: PathBuf,
    output: Option<PathBuf>,
    materials: Option<PathBuf>,
    resume: Option<PathBuf>,
    snapshot: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--example" {
        print_example_config();
        return;
    }

    let Some(options) = parse_args(&args) else {
        print_usage(&args[0]);
        std::process::exit(1);
    };

    // Load configuration
    let config_str = fs::read_to_string(&options.config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: OptimizerConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    let catalogs = match &options.materials {
        Some(path) => {
            let materials = MaterialCatalog::load(path).unwrap_or_else(|e| {
                eprintln!("Error loading material catalog: {}", e);
                std::process::exit(1);
            });
            Catalogs::with_materials(materials)
        }
        None => Catalogs::default(),
    };

    let snapshot = options.resume.as_ref().map(|path| {
        let snapshot = PopulationSnapshot::load(path).unwrap_or_else(|e| {
            eprintln!("Error loading population snapshot: {}", e);
            std::process::exit(1);
        });
        println!(
            "Resuming from generation {} ({} individuals)",
            snapshot.generation,
            snapshot.len()
        );
        snapshot
    });

    let ranch = &config.ranch;
    println!("Ranch Layout Search");
    println!("===================");
    println!("Plot: {}m x {}m", ranch.plot_width, ranch.plot_height);
    for species in ranch.housed_species() {
        println!("  {}: {} animals", species, ranch.count(species));
    }
    println!("Budget: {:.2}", ranch.budget.amount);
    println!(
        "Population: {}, max generations: {}",
        config.population.size, config.population.max_generations
    );
    println!();

    let outcome = EvolutionEngine::new(config.clone(), &catalogs).map(|engine| {
        let mut engine = match snapshot {
            Some(snapshot) => engine.with_snapshot(snapshot),
            None => engine,
        };
        let result = engine.run_with_callback(print_progress);

        if let Some(path) = &options.snapshot {
            match PopulationSnapshot::capture(&engine).save(path) {
                Ok(()) => println!("Population saved to {}", path.display()),
                Err(e) => eprintln!("Error saving population: {}", e),
            }
        }
        result
    });

    match &outcome {
        Ok(result) => print_result(result, &catalogs),
        Err(err) => {
            eprintln!("Invalid configuration:");
            for message in err.messages() {
                eprintln!("  - {}", message);
            }
        }
    }

    if let Some(path) = &options.output {
        let record = RunRecord::from_outcome(&outcome, &config);
        match record.save(path) {
            Ok(()) => println!("Run record written to {}", path.display()),
            Err(e) => eprintln!("Error writing run record: {}", e),
        }
    }

    if outcome.is_err() {
        std::process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Option<Options> {
    let mut rest = args.iter().skip(1);
    let config_path = PathBuf::from(rest.next()?);
    let mut options = Options {
        config_path,
        output: None,
        materials: None,
        resume: None,
        snapshot: None,
    };

    while let Some(flag) = rest.next() {
        let value = PathBuf::from(rest.next()?);
        match flag.as_str() {
            "--output" => options.output = Some(value),
            "--materials" => options.materials = Some(value),
            "--resume" => options.resume = Some(value),
            "--snapshot" => options.snapshot = Some(value),
            _ => return None,
        }
    }
    Some(options)
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <config.json> [options]", program);
    eprintln!();
    eprintln!("Search for a ranch enclosure layout from JSON configuration.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --output <path>     Write the run record as JSON");
    eprintln!("  --materials <path>  Use a material catalog from JSON");
    eprintln!("  --resume <path>     Seed the population from a snapshot");
    eprintln!("  --snapshot <path>   Save the final population");
    eprintln!();
    eprintln!("Example configuration is generated with --example flag.");
}

fn print_progress(progress: &EvolutionProgress) {
    let every = (progress.max_generations / 10).max(1);
    if progress.generation % every == 0 {
        println!(
            "  Generation {}/{}: best={:.4}, mean={:.4}, diversity={:.3}, {:.1}s",
            progress.generation,
            progress.max_generations,
            progress.stats.best,
            progress.stats.mean,
            progress.stats.diversity,
            progress.elapsed_seconds
        );
    }
}

fn print_result(result: &OptimizationResult, catalogs: &Catalogs) {
    let Assessment {
        layout,
        verdict,
        cost,
        effective_budget,
        objectives,
        ..
    } = &result.assessment;

    println!();
    println!("Stopped: {}", result.stop_reason);
    println!(
        "Generations: {}, evaluations: {}, time: {:.2}s",
        result.generations, result.evaluations, result.elapsed_seconds
    );
    println!("Best fitness: {:.4} ({:?})", result.best_fitness, verdict);
    println!(
        "Cost: {:.2} (fencing {:.2}, corridors {:.2}, fittings {:.2}) / budget {:.2}",
        cost.total(),
        cost.fencing,
        cost.corridors,
        cost.fittings,
        effective_budget
    );
    if let Some(objectives) = objectives {
        println!(
            "Land utilization: {:.3}, handling efficiency: {:.3}",
            objectives.land_utilization, objectives.handling_efficiency
        );
    }
    println!();
    println!("Enclosures:");
    for enclosure in &layout.enclosures {
        let rect = enclosure.rect();
        println!(
            "  {:<8} at ({:.1}, {:.1}) size {:.1} x {:.1} ({:.1} m2)",
            enclosure.species.to_string(),
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            rect.area()
        );
    }
    println!(
        "Corridor width: {:.2}m, occupancy: {:.1}%",
        layout.infrastructure.corridor_width,
        layout.occupancy() * 100.0
    );

    for warning in layout.separation_warnings(&catalogs.species) {
        println!(
            "Warning: {} and {} are {:.1}m apart, {:.1}m recommended",
            warning.first, warning.second, warning.distance, warning.recommended
        );
    }
}

fn print_example_config() {
    let config = OptimizerConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
