// SPDX-License-Identifier: MIT

use fdpru::prelude::*;

fn device(geometry: Geometry, nruh: u16) -> FdpDevice {
    let params = FdpParams {
        num_ruhs: nruh,
        ..FdpParams::default()
    };
    FdpDevice::with_clock(geometry, params, Box::new(ManualClock::new(1_000, 1))).unwrap()
}

fn small() -> FdpDevice {
    device(Geometry::new(4096, 4, 32), 4)
}

/// Pages of 4 KiB expressed as 0-based 512-byte blocks.
fn nlb(pages: u16) -> u16 {
    pages * 8 - 1
}

fn partition_sum(dev: &FdpDevice) -> usize {
    let pool = dev.pool();
    let ru_free: usize = dev
        .fdp()
        .rus()
        .iter()
        .map(|ru| pool.free_count(Some(ru.id())))
        .sum();
    pool.global_free()
        + ru_free
        + pool.count_state(LineState::Open)
        + pool.count_state(LineState::Full)
}

#[test]
fn partition_holds_across_operations() {
    let mut dev = small();
    let total = dev.pool().total_lines();
    assert_eq!(partition_sum(&dev), total);

    dev.flip(FLIP_ENABLE_FDP);
    assert_eq!(partition_sum(&dev), total);

    for (i, ph) in [0u16, 3, 1, 1, 2, 0, 3, 3].iter().enumerate() {
        dev.write(WriteCmd::placed(i as u64, nlb(3), *ph)).unwrap();
        assert_eq!(partition_sum(&dev), total);
    }
    dev.gc(3).unwrap();
    assert_eq!(partition_sum(&dev), total);

    dev.flip(FLIP_DISABLE_FDP);
    assert_eq!(partition_sum(&dev), total);
    assert!(dev.check_all().ok());
}

#[test]
fn writes_stay_in_their_ru() {
    let mut dev = small();
    dev.flip(FLIP_ENABLE_FDP);

    for round in 0..3u64 {
        for ph in 0..4u16 {
            let rep = dev.write(WriteCmd::placed(round, nlb(2), ph)).unwrap();
            let ru = rep.ru.unwrap();
            assert_eq!(ru, RuId(ph));
            for line in &rep.lines {
                assert_eq!(dev.pool().line(*line).unwrap().owner(), Some(ru));
            }
        }
    }

    // no line holds data of two RUs: every written line has a single owner
    let mut seen = std::collections::HashMap::new();
    for line in dev.pool().lines() {
        if line.written_pages() > 0 {
            let prev = seen.insert(line.id(), line.owner());
            assert!(prev.is_none());
            assert!(line.owner().is_some());
        }
    }
}

#[test]
fn reclaimed_lines_return_to_owner() {
    let mut dev = small();
    dev.flip(FLIP_ENABLE_FDP);

    // fill two lines of RU 2 and one of RU 0
    dev.write(WriteCmd::placed(0, nlb(8), 2)).unwrap();
    dev.write(WriteCmd::placed(0, nlb(4), 0)).unwrap();
    let before: Vec<usize> = (0..4)
        .map(|i| dev.pool().free_count(Some(RuId(i))))
        .collect();

    let reclaimed = dev.gc(usize::MAX).unwrap();
    assert_eq!(reclaimed.len(), 3);
    for r in &reclaimed {
        let owner = r.owner.unwrap();
        assert_eq!(dev.pool().line(r.line).unwrap().owner(), Some(owner));
        assert!(dev.pool().free_lines(Some(owner)).any(|l| l == r.line));
    }
    assert_eq!(dev.pool().free_count(Some(RuId(2))), before[2] + 2);
    assert_eq!(dev.pool().free_count(Some(RuId(0))), before[0] + 1);
    assert_eq!(dev.pool().free_count(Some(RuId(1))), before[1]);
    assert_eq!(dev.pool().global_free(), 0);
}

#[test]
fn distribution_is_fair() {
    for lines in [4u32, 5, 17, 31, 64] {
        let mut dev = device(Geometry::new(4096, 4, lines), 4);
        let dist = dev.enable_fdp().unwrap().unwrap();
        let max = *dist.per_ru.iter().max().unwrap();
        let min = *dist.per_ru.iter().min().unwrap();
        assert!(max - min <= 1, "{lines} lines: {:?}", dist.per_ru);
        assert_eq!(dist.lines_distributed(), lines as usize);
        // extra lines go to the lowest indices
        assert!(dist.per_ru.windows(2).all(|w| w[0] >= w[1]));
    }
}

#[test]
fn too_few_lines_keeps_fdp_off() {
    let mut dev = device(Geometry::new(4096, 4, 3), 4);
    assert_eq!(dev.enable_fdp(), Err(FdpError::DistributionFailed(RuId(3))));
    assert!(!dev.fdp().is_enabled());
    // writes still work through the default path
    let rep = dev.write(WriteCmd::placed(0, nlb(1), 0)).unwrap();
    assert_eq!(rep.ru, None);
}

#[test]
fn counters_never_decrease() {
    let mut dev = small();
    dev.flip(FLIP_ENABLE_FDP);
    let mut last = vec![0u64; 4];
    let mut last_total = 0u64;

    for i in 0..24u16 {
        let ph = i % 4;
        let _ = dev.write(WriteCmd::placed(i as u64, nlb(1 + i % 3), ph));
        if i % 5 == 0 {
            dev.gc(1).unwrap();
        }
        for (n, ru) in dev.fdp().rus().iter().enumerate() {
            assert!(ru.host_bytes_written() >= last[n]);
            assert_eq!(ru.media_bytes_written(), ru.host_bytes_written());
            last[n] = ru.host_bytes_written();
        }
        let total = dev.fdp().totals().host_bytes_written;
        assert!(total >= last_total);
        last_total = total;
    }
}

#[test]
fn exhaustion_is_reported_not_fatal() {
    // one line per RU
    let mut dev = device(Geometry::new(4096, 4, 4), 4);
    dev.flip(FLIP_ENABLE_FDP);
    dev.write(WriteCmd::placed(0, nlb(3), 1)).unwrap();

    let err = dev.write(WriteCmd::placed(0, nlb(2), 1)).unwrap_err();
    assert_eq!(err, FdpError::RuExhausted(RuId(1)));
    assert_eq!(err.status().code(), Status::CAPACITY_EXCEEDED.0);

    // RU 1 untouched by the failed write; other RUs still accept data
    let ru = dev.fdp().ru(RuId(1)).unwrap();
    assert_eq!(ru.host_bytes_written(), 3 * 4096);
    assert_eq!(ru.write_pointer().page, 3);
    dev.write(WriteCmd::placed(0, nlb(4), 2)).unwrap();
    dev.write(WriteCmd::placed(0, nlb(1), 1)).unwrap();
    assert!(dev.check_all().ok());
}

#[test]
fn disable_then_enable_is_deterministic() {
    let mut dev = device(Geometry::new(4096, 4, 22), 4);
    let first = dev.enable_fdp().unwrap().unwrap();
    assert!(dev.disable_fdp());
    assert_eq!(dev.pool().global_free(), 22);
    assert!(dev.fdp().rus().iter().all(|r| r.state() == RuState::Unused));

    let second = dev.enable_fdp().unwrap().unwrap();
    assert_eq!(first.per_ru, second.per_ru);
    assert_eq!(first.per_ru, [6, 6, 5, 5]);
}

#[test]
fn enabling_twice_distributes_once() {
    let mut dev = small();
    assert!(dev.enable_fdp().unwrap().is_some());
    dev.write(WriteCmd::placed(0, nlb(1), 0)).unwrap();
    assert!(dev.enable_fdp().unwrap().is_none());
    assert_eq!(dev.fdp().ru(RuId(0)).unwrap().host_bytes_written(), 4096);
    assert!(dev.disable_fdp());
    assert!(!dev.disable_fdp());
}

#[test]
fn written_data_is_disowned_on_disable() {
    let mut dev = small();
    dev.flip(FLIP_ENABLE_FDP);
    dev.write(WriteCmd::placed(0, nlb(6), 1)).unwrap();
    dev.flip(FLIP_DISABLE_FDP);

    assert!(dev.pool().lines().iter().all(|l| l.owner().is_none()));
    let reclaimed = dev.gc(usize::MAX).unwrap();
    assert_eq!(reclaimed.len(), 2);
    assert!(reclaimed.iter().all(|r| r.owner.is_none()));
    assert_eq!(dev.pool().global_free(), 32);
}

#[test]
fn reclaim_group_bits_select_group() {
    let params = FdpParams {
        num_rgs: 2,
        num_ruhs: 2,
        ..FdpParams::default()
    };
    let mut dev = FdpDevice::with_clock(
        Geometry::new(4096, 4, 16),
        params,
        Box::new(ManualClock::default()),
    )
    .unwrap();
    dev.flip(FLIP_ENABLE_FDP);
    assert_eq!(dev.fdp().rgif(), 1);

    // rg 1, ph 1
    let rep = dev.write(WriteCmd::placed(0, nlb(1), 0x8001)).unwrap();
    assert_eq!(rep.ru, Some(RuId(3)));
    let ru = dev.fdp().ru(RuId(3)).unwrap();
    assert_eq!((ru.rgid(), ru.ruhid()), (1, 1));
}
