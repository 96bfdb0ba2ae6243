use itertools::Itertools;
use pmu::{catalog, cpu_family, Error};
use pmu_data::{AMD_GENOA, AMD_MILAN, GRAVITON2, GRAVITON3, GRAVITON4};

const ICX: &str = "Intel(R) Xeon(R) Platinum 8375C CPU @ 2.90GHz";
const SPR: &str = "Intel(R) Xeon(R) Platinum 8488C";
const SKX: &str = "Intel(R) Xeon(R) Platinum 8124M CPU @ 3.00GHz";

#[test]
fn every_stat_is_well_formed() {
    let mut platforms = 0;
    for platform in catalog::platforms() {
        platforms += 1;
        assert!(platform.stat_names().count() > 0, "{}", platform.name());

        for stat in platform.stats() {
            assert!(stat.scale.is_finite() && stat.scale > 0.0, "{stat:?}");
            assert!(!stat.numerator.is_empty(), "{stat:?}");
            assert!(!stat.denominator.is_empty(), "{stat:?}");
            assert_ne!(stat.numerator, stat.denominator, "{stat:?}");
        }
    }

    assert_eq!(platforms, 11);
}

#[test]
fn every_platform_has_ipc() {
    for platform in catalog::platforms() {
        let ipc = platform.lookup("ipc").expect("ipc");
        assert_eq!(ipc.scale, 1.0);
    }
}

#[test]
fn overlay_overrides_universal_table() {
    let universal = catalog::lookup(SKX, "stall_backend_pkc").unwrap();
    let icx = catalog::lookup(ICX, "stall_backend_pkc").unwrap();
    let spr = catalog::lookup(SPR, "l2-mpki").unwrap();

    assert_eq!(universal.numerator, "cpu/event=0xA2,umask=0x1/");
    assert_eq!(icx.numerator, "cpu/event=0xa4,umask=0x2/");
    assert_eq!(icx.denominator, "cpu/event=0xa4,umask=0x01/");
    assert_eq!(spr.numerator, "cpu/event=0x25,umask=0x1f/");
}

#[test]
fn overlay_adds_stats() {
    let graviton2 = catalog::find_platform(GRAVITON2).unwrap();
    let graviton3 = catalog::find_platform(GRAVITON3).unwrap();
    let graviton4 = catalog::find_platform(GRAVITON4).unwrap();

    assert!(graviton2.get("stall_backend_mem_pkc").is_none());
    assert!(graviton3.get("stall_backend_mem_pkc").is_some());
    assert_eq!(
        graviton3.stat_names().collect::<Vec<_>>(),
        graviton4.stat_names().collect::<Vec<_>>()
    );
    assert_eq!(
        graviton3.stat_names().count(),
        graviton2.stat_names().count() + 1
    );
}

#[test]
fn genoa_backend_stall_scale() {
    let stat = catalog::lookup(AMD_GENOA, "stall_backend_pkc").unwrap();
    assert!((stat.scale - 1000.0 / 6.0).abs() < 1e-9);

    assert!(catalog::lookup(AMD_MILAN, "stall_backend_pkc").is_err());
    assert!(catalog::lookup(AMD_MILAN, "stall_backend_pkc1").is_ok());
}

#[test]
fn milan_stat_names() {
    let milan = catalog::find_platform(AMD_MILAN).unwrap();

    insta::assert_snapshot!(milan.stat_names().join("\n"), @r"
    branch-mpki
    data-l1-mpki
    data-tlb-mpki
    data-tlb-tw-pki
    inst-l1-mpki
    inst-tlb-mpki
    inst-tlb-tw-pki
    ipc
    l2-mpki
    l3-mpki
    stall_backend_pkc1
    stall_backend_pkc2
    stall_frontend_pkc
    ");
}

#[test]
fn lookup_errors() {
    assert!(matches!(
        catalog::lookup("Pentium III", "ipc"),
        Err(Error::UnsupportedPlatform(_))
    ));
    assert!(matches!(
        catalog::lookup(GRAVITON2, "data-st-tlb-mpki"),
        Err(Error::UnknownStat { .. })
    ));
}

#[test]
fn identified_platforms_are_in_catalog() {
    let cpuinfo = [
        "model name\t: AMD EPYC 7R13 Processor\n",
        "model name\t: AMD EPYC 9R14 96-Core Processor\n",
        "CPU part\t: 0xd0c\n",
        "CPU part\t: 0xd40\n",
        "CPU part\t: 0xd4f\n",
        "model name\t: Intel(R) Xeon(R) Platinum 8488C\n",
    ];

    for text in cpuinfo {
        let platform = cpu_family::identify_platform(text.as_bytes()).unwrap();
        assert!(catalog::find_platform(&platform).is_some(), "{platform}");
    }
}
