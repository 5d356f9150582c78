//! Benchmark aggregate hacksteader queries with a 200-steader dataset.

use criterion::{criterion_group, criterion_main, Criterion};
use hacksteader_common::{Owner, PossessionKind, SeedGrower};
use hacksteader_db::models::{Craft, Hacksteader, Land, Plant, Possession, Tile};
use hacksteader_db::pool::init_memory_pool;
use hacksteader_db::queries::{hacksteaders, market, tiles_steaders};

fn farm(user_id: &str) -> Hacksteader {
    let mut steader = Hacksteader::new(user_id, 4);
    for i in 0..4 {
        steader.land.push(Land::planted(
            Tile::new(user_id),
            Plant::new(i, 30.0, vec![SeedGrower::new(user_id, 0)]),
            (i % 2 == 0).then(|| Craft::new(5.0, false, 3)),
        ));
    }
    for i in 0..6 {
        steader.inventory.push(Possession::new(
            i,
            PossessionKind::seed(user_id),
            Owner::farmer(user_id),
        ));
    }
    steader
}

fn setup() -> r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager> {
    let pool = init_memory_pool().expect("pool");
    let conn = pool.get().expect("conn");

    for i in 0..200 {
        hacksteaders::insert_hacksteader(&conn, &farm(&format!("U{i:04}"))).unwrap();
    }
    conn
}

fn bench_db_queries(c: &mut Criterion) {
    let conn = setup();

    let mut group = c.benchmark_group("db_hacksteaders");

    group.bench_function("get_hacksteader", |b| {
        b.iter(|| {
            hacksteaders::get_hacksteader(&conn, "U0100").unwrap();
        });
    });

    group.bench_function("tiles_of_steader", |b| {
        b.iter(|| {
            tiles_steaders::tiles_of(&conn, "U0100").unwrap();
        });
    });

    group.bench_function("update_hacksteader", |b| {
        let mut steader = hacksteaders::get_hacksteader(&conn, "U0150").unwrap().unwrap();
        b.iter(|| {
            steader.profile.xp += 1;
            hacksteaders::update_hacksteader(&conn, &steader).unwrap();
        });
    });

    group.bench_function("possessions_for_sale", |b| {
        b.iter(|| {
            market::possessions_for_sale(&conn, None).unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_db_queries);
criterion_main!(benches);
