use criterion::{black_box, criterion_group, criterion_main, Criterion};

use markmerge_core::delimited::DelimitedParser;

fn bench_delimited(c: &mut Criterion) {
    let mut group = c.benchmark_group("delimited");
    let parser = DelimitedParser::default();

    let plain = generate_scans(30, false);
    let quoted = generate_scans(30, true);
    let large = generate_scans(2000, true);

    group.bench_function("30_rows_plain", |b| {
        b.iter(|| parser.parse(black_box(&plain)))
    });

    group.bench_function("30_rows_quoted", |b| {
        b.iter(|| parser.parse(black_box(&quoted)))
    });

    group.bench_function("2000_rows_quoted", |b| {
        b.iter(|| parser.parse(black_box(&large)))
    });

    group.finish();
}

fn bench_answer_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("answer_keys");

    let json = generate_answer_keys_json(4, 100);

    group.bench_function("4_versions_100_questions", |b| {
        b.iter(|| {
            markmerge_core::answer_key::parse_answer_keys_str(
                black_box(&json),
                black_box("bench.json".as_ref()),
            )
        })
    });

    group.finish();
}

/// A scan export with 50 response columns per row.
fn generate_scans(rows: usize, quoted_names: bool) -> String {
    let mut s = String::from("Last,First,MI,ID,Version,Date,Score");
    for q in 1..=50 {
        s.push_str(&format!(",Q{q}"));
    }
    for i in 0..rows {
        let last = if quoted_names {
            format!("\"Student{i},\"")
        } else {
            format!("Student{i}")
        };
        s.push_str(&format!("\r\n{last},Pat,,{i:06},A,,"));
        for q in 0..50 {
            s.push_str(&format!(",{}", (i + q) % 5 + 1));
        }
    }
    s
}

fn generate_answer_keys_json(versions: usize, questions: usize) -> String {
    let keys: Vec<String> = (0..versions)
        .map(|v| {
            let entries: Vec<String> = (1..=questions)
                .map(|q| match q % 7 {
                    0 => format!("\"{q}\": [\"A\", \"C\"]"),
                    r => format!("\"{q}\": \"{}\"", ["A", "B", "C", "D", "E", "A"][r - 1]),
                })
                .collect();
            format!(
                "{{\"version\": \"{}\", \"questionWeight\": 2, \"key\": {{{}}}}}",
                (b'A' + v as u8) as char,
                entries.join(", ")
            )
        })
        .collect();
    format!("[{}]", keys.join(", "))
}

criterion_group!(benches, bench_delimited, bench_answer_keys);
criterion_main!(benches);
