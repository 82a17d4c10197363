use criterion::{black_box, criterion_group, criterion_main, Criterion};
use polars::prelude::*;
use weather_diary::{finalize_features, preprocess_frame, RAW_HEADER};

const CLOUDS: [&str; 6] = [
    "Ясно",
    "Малооблачно",
    "Переменная облачность",
    "Пасмурно",
    "Неизвестно",
    "Нет данных",
];
const WINDS: [&str; 5] = ["С 3м/с", "ЮЗ 5 м/с", "СВ 1м/с", "Ш", "З 12м/с"];

fn year_of_rows() -> DataFrame {
    let days = 365;
    let cell = |i: usize, col: usize| -> String {
        match col {
            0 => format!("2023-{:02}-{:02}", i / 31 % 12 + 1, i % 28 + 1),
            1 | 5 => {
                let t = (i % 40) as i32 - 15;
                if t < 0 {
                    format!("−{}", -t)
                } else {
                    format!("+{t}")
                }
            }
            2 | 6 => format!("{}", 740 + i % 25),
            3 | 7 => CLOUDS[(i + col) % CLOUDS.len()].to_string(),
            _ => WINDS[(i + col) % WINDS.len()].to_string(),
        }
    };
    let columns = RAW_HEADER
        .iter()
        .enumerate()
        .map(|(col, name)| {
            let values: Vec<String> = (0..days).map(|i| cell(i, col)).collect();
            Column::new((*name).into(), values)
        })
        .collect();
    DataFrame::new(columns).expect("valid benchmark frame")
}

fn bench_preprocess(c: &mut Criterion) {
    let raw = year_of_rows();
    c.bench_function("preprocess_frame", |b| {
        b.iter(|| preprocess_frame(black_box(&raw)))
    });

    let features = preprocess_frame(&raw).expect("preprocess benchmark frame");
    c.bench_function("finalize_features", |b| {
        b.iter(|| finalize_features(black_box(&features), true))
    });
}

criterion_group!(benches, bench_preprocess);
criterion_main!(benches);
