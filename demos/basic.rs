use glam::*;
use two_level_bvh::{
    bvh::Bvh,
    mesh::Mesh,
    ray::Ray,
    test_util::geometry::{cube_tris, quad},
};

fn main() {
    // Build a scene with a cube hovering in front of a large quad
    let mut tris = cube_tris(vec3a(0.0, 0.0, 0.0), 0.5);
    tris.extend(quad(vec3a(0.0, 0.0, -2.0), 16.0));

    let bvh = Bvh::build(Mesh::from_triangles(tris)).unwrap();

    // Create a new ray
    let mut ray = Ray::new(vec3a(0.1, 0.1, 4.0), vec3a(0.0, 0.0, -1.0));

    // Traverse the BVH, finding the closest hit.
    bvh.intersect(&mut ray, 0);
    if ray.hit.is_hit() {
        println!("Hit Triangle {}", ray.hit.prim());
        println!("Distance to hit: {}", ray.hit.t);
    } else {
        println!("Miss");
    }
}
