//! Integration tests for link functions

use approx::assert_relative_eq;

use secrfit_rs::parameters::{Bounds, LinkKind, LinkRegistry, LINK_SCALE_LIMIT, PARAMETER_TABLE};

#[test]
fn test_round_trip_over_valid_domain() {
    let samples = [1e-6, 0.01, 0.3, 0.5, 0.97, 0.999999];
    for x in samples {
        assert_relative_eq!(LinkKind::Logit.inverse(LinkKind::Logit.link(x)), x, max_relative = 1e-9);
    }

    for x in [1e-8, 0.5, 1.0, 42.0, 1e6] {
        assert_relative_eq!(LinkKind::Log.inverse(LinkKind::Log.link(x)), x, max_relative = 1e-12);
    }

    for x in [-100.0, -1.5, 0.0, 3.25, 99.0] {
        assert_eq!(LinkKind::Identity.inverse(LinkKind::Identity.link(x)), x);
    }
}

#[test]
fn test_every_table_entry_round_trips_inside_default_bounds() {
    let registry = LinkRegistry::new();
    for record in PARAMETER_TABLE.iter() {
        let link = registry.get(record.name).unwrap();
        assert_eq!(link, record.link);

        let bounds = record.default_bounds();
        let mid = match link {
            LinkKind::Logit => 0.5,
            LinkKind::Log => (bounds.max.min(1e4)) / 2.0,
            LinkKind::Identity => (bounds.min + bounds.max) / 2.0 + 1.0,
        };
        let back = registry.inverse(record.name, registry.link(record.name, mid).unwrap()).unwrap();
        assert_relative_eq!(back, mid, max_relative = 1e-12);
    }
}

#[test]
fn test_boundary_values_clamped_on_link_scale() {
    let (lower, upper) = Bounds::new(0.0, 1e8).unwrap().to_link(LinkKind::Log);
    assert_eq!(lower, -LINK_SCALE_LIMIT);
    assert_relative_eq!(upper, 1e8f64.ln());

    assert_eq!(LinkKind::Logit.link_finite(1.0), LINK_SCALE_LIMIT);
    assert_eq!(LinkKind::Logit.inverse(LINK_SCALE_LIMIT), 1.0);
}
