use chrono::{Duration, NaiveDate};

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

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len() as u64) as usize]
    }
}

fn main() {
    let mut rng = SimpleRng::new(42);

    let owners = ["Riotur", "SMAC", "Prefeitura", "IPP", "SECONSERVA"];
    let types = ["Museum", "Park", "Beach", "Monument", "Event"];
    let places = [
        "Cristo Redentor",
        "Pão de Açúcar",
        "Jardim Botânico",
        "Museu do Amanhã",
        "Praia de Copacabana",
        "Escadaria Selarón",
        "Theatro Municipal",
        "Parque Lage",
    ];

    let base = NaiveDate::from_ymd_opt(2019, 1, 1)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .expect("valid base date");

    let output_path = "sample_tourism.csv";
    let mut writer = csv::Writer::from_path(output_path).expect("Failed to create output file");
    writer
        .write_record(["id", "title", "owner", "type", "created", "modified", "visitors"])
        .expect("Failed to write header");

    let n_rows = 500;
    for id in 0..n_rows {
        let created = base + Duration::minutes(rng.below(5 * 365 * 24 * 60) as i64);
        let modified = created + Duration::hours(rng.below(24 * 90) as i64);
        let record = [
            id.to_string(),
            format!("{} #{}", rng.pick(&places), rng.below(100)),
            rng.pick(&owners).to_string(),
            rng.pick(&types).to_string(),
            created.format("%Y-%m-%d %H:%M:%S").to_string(),
            modified.format("%Y-%m-%d %H:%M:%S").to_string(),
            rng.below(50_000).to_string(),
        ];
        writer.write_record(&record).expect("Failed to write row");
    }
    writer.flush().expect("Failed to flush output");

    println!("Wrote {n_rows} records to {output_path}");
}
