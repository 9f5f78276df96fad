use nalgebra::{Point3, Vector3};
use pointkernel::{
    Axis, CappedCylinder, Cuboid, FiniteRay, InfiniteAnnulus, Library, SemiInfiniteSlab, Shell,
    Shield, Sphere,
};

fn ray(start: [f64; 3], end: [f64; 3]) -> FiniteRay {
    FiniteRay::from_slices(&start, &end).unwrap()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[test]
fn crossing_lengths_through_each_shape() {
    let library = Library::bundled().unwrap();
    let iron = library.material("iron").unwrap();
    let shield = |geometry: pointkernel::Geometry| Shield::new(iron.clone(), geometry);

    let slab = shield(SemiInfiniteSlab::new(Axis::X, 10.0, 20.0).unwrap().into());
    assert_close(
        slab.crossing_length(&ray([0.0; 3], [30.0; 3])).unwrap(),
        10.0 * 3f64.sqrt(),
    );

    let sphere = shield(Sphere::new(Point3::origin(), 5.0).unwrap().into());
    assert_close(sphere.crossing_length(&ray([-10.0, 0.0, 0.0], [10.0, 0.0, 0.0])).unwrap(), 10.0);
    assert_close(sphere.crossing_length(&ray([-10.0, 0.0, 0.0], [0.0, 0.0, 0.0])).unwrap(), 5.0);

    let shell = shield(Shell::new(Point3::origin(), 3.0, 2.0).unwrap().into());
    assert_close(shell.crossing_length(&ray([-10.0, 0.0, 0.0], [10.0, 0.0, 0.0])).unwrap(), 4.0);

    let cuboid = shield(Cuboid::new(Point3::origin(), Vector3::new(2.0, 2.0, 2.0)).unwrap().into());
    assert_close(
        cuboid.crossing_length(&ray([-5.0; 3], [5.0; 3])).unwrap(),
        2.0 * 3f64.sqrt(),
    );

    let annulus = shield(InfiniteAnnulus::aligned(Axis::Z, Point3::origin(), 2.0, 4.0).unwrap().into());
    assert_close(annulus.crossing_length(&ray([-10.0, 0.0, 0.0], [10.0, 0.0, 0.0])).unwrap(), 4.0);

    let cylinder = shield(CappedCylinder::aligned(Axis::Z, Point3::origin(), 20.0, 6.0).unwrap().into());
    assert_close(cylinder.crossing_length(&ray([0.0, 0.0, -30.0], [0.0, 0.0, 30.0])).unwrap(), 20.0);
    assert_close(cylinder.crossing_length(&ray([-10.0, 0.0, 0.0], [10.0, 0.0, 0.0])).unwrap(), 12.0);
    assert_close(cylinder.crossing_length(&ray([10.0, 0.0, 15.0], [-10.0, 0.0, 15.0])).unwrap(), 0.0);
}

#[test]
fn nested_bodies_partition_the_ray() {
    // a core sphere inside a shell inside a box
    let library = Library::bundled().unwrap();
    let water = library.material("water").unwrap();
    let shields = [
        Shield::new(water.clone(), Sphere::new(Point3::origin(), 3.0).unwrap()),
        Shield::new(water.clone(), Shell::new(Point3::origin(), 3.0, 2.0).unwrap()),
        Shield::new(water, Cuboid::new(Point3::new(10.0, 0.0, 0.0), Vector3::new(4.0, 20.0, 20.0)).unwrap()),
    ];
    let r = ray([0.0, 0.0, 0.0], [30.0, 0.0, 0.0]);
    let lengths: Vec<f64> = shields.iter().map(|s| s.crossing_length(&r).unwrap()).collect();
    assert_close(lengths[0], 3.0);
    assert_close(lengths[1], 2.0);
    assert_close(lengths[2], 4.0);
    assert_close(r.length() - lengths.iter().sum::<f64>(), 21.0);
}

#[test]
fn crossing_mfp_uses_the_shield_material() {
    let library = Library::bundled().unwrap();
    let lead = library.material("lead").unwrap();
    let shield = Shield::new(lead.clone(), SemiInfiniteSlab::new(Axis::Y, 0.0, 5.0).unwrap())
        .with_label("lead apron");
    let r = ray([0.0, -10.0, 0.0], [0.0, 10.0, 0.0]);
    let mfp = shield.crossing_mfp(&r, 0.662).unwrap();
    assert_close(mfp, lead.mfp(0.662, 5.0).unwrap());
    assert_eq!(shield.label(), "lead apron");
}

#[test]
fn zero_length_rays_cross_nothing() {
    let sphere = Sphere::new(Point3::origin(), 5.0).unwrap();
    let shield = Shield::new(Library::bundled().unwrap().material("iron").unwrap(), sphere);
    let r = ray([1.0, 1.0, 1.0], [1.0, 1.0, 1.0]);
    assert_eq!(r.length(), 0.0);
    assert_eq!(shield.crossing_length(&r).unwrap(), 0.0);
}
