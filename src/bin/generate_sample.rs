use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use table_cleaner::data::writer::write_file;
use table_cleaner::{CellValue, Column, Dataset};

/// Write a deterministic messy table for trying out the cleaner.
#[derive(Parser, Debug)]
#[command(name = "generate_sample", about)]
struct Cli {
    /// Output path; format chosen by extension
    #[arg(default_value = "sample_data.parquet")]
    output: PathBuf,

    /// Number of distinct customers before duplication
    #[arg(long, default_value_t = 200)]
    rows: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// A signup date in one of several layouts, occasionally garbage.
fn messy_date(rng: &mut SimpleRng) -> CellValue {
    if rng.chance(0.05) {
        return CellValue::Null;
    }
    if rng.chance(0.08) {
        let junk = ["unknown", "n/a", "2021-13-45", "yesterday"];
        return CellValue::from(junk[rng.below(junk.len())]);
    }
    let year = 2018 + rng.below(6);
    let month = 1 + rng.below(12);
    let day = 1 + rng.below(28);
    let text = match rng.below(3) {
        0 => format!("{year}-{month:02}-{day:02}"),
        1 => format!("{month:02}/{day:02}/{year}"),
        _ => format!("{year}-{month:02}-{day:02}T{:02}:{:02}:00", rng.below(24), rng.below(60)),
    };
    CellValue::Text(text)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut rng = SimpleRng::new(cli.seed);

    let cities = ["Oslo", "Lisbon", "Krakow", "Nantes"];
    let plans = ["free", "pro", "team"];

    let mut rows: Vec<[CellValue; 6]> = Vec::with_capacity(cli.rows * 11 / 10);
    for id in 0..cli.rows {
        let spend = if rng.chance(0.1) {
            CellValue::Null
        } else {
            CellValue::Float((rng.next_f64() * 50_000.0).round() / 100.0)
        };
        let row = [
            CellValue::Integer(id as i64 + 1),
            CellValue::from(cities[rng.below(cities.len())]),
            CellValue::from(plans[rng.below(plans.len())]),
            spend,
            CellValue::Bool(rng.chance(0.7)),
            messy_date(&mut rng),
        ];
        // Re-submitted forms show up as exact duplicates.
        if rng.chance(0.1) {
            rows.push(row.clone());
        }
        rows.push(row);
    }

    let names = ["customer_id", "city", "plan", "spend", "active", "signup"];
    let columns = names
        .iter()
        .enumerate()
        .map(|(i, name)| Column::new(*name, rows.iter().map(|row| row[i].clone())))
        .collect();
    let dataset = Dataset::new(columns)?;

    write_file(&dataset, &cli.output)?;
    println!(
        "Wrote {} rows ({} distinct customers) to {}",
        dataset.height(),
        cli.rows,
        cli.output.display()
    );
    Ok(())
}
