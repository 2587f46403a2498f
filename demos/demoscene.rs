use std::str::FromStr;
use std::sync::Arc;

use argh::FromArgs;
use glam::*;
use image::{ImageBuffer, Rgba};

use two_level_bvh::{
    bvh::Bvh, instance::Instance, mesh::Mesh, par::Scheduler, ray::Ray,
    test_util::geometry::cube_tris, tlas::Tlas, Timer,
};

#[derive(PartialEq, Eq)]
enum Builder {
    Reference,
    Quick,
}

impl FromStr for Builder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ref" => Ok(Self::Reference),
            "quick" => Ok(Self::Quick),
            _ => Err(format!("Unknown mode: '{s}', valid modes: 'ref', 'quick'")),
        }
    }
}

#[derive(FromArgs)]
/// `demoscene` example
struct Args {
    /// tlas builder. Modes: 'ref', 'quick'
    #[argh(option, default = "Builder::Quick")]
    builder: Builder,
    /// threading backend. Modes: 'seq', 'rayon'
    #[argh(option, default = "Scheduler::Rayon")]
    backend: Scheduler,
}

fn main() {
    let args: Args = argh::from_env();

    // One cube BLAS instanced on a jittered grid of columns
    let bvh = Arc::new(Bvh::build(Mesh::from_triangles(cube_tris(Vec3A::ZERO, 0.5))).unwrap());
    let side = 32usize;
    let mut instances = Vec::with_capacity(side * side);
    for z in 0..side {
        for x in 0..side {
            let idx = (z * side + x) as u32;
            let h = ((x * 7 + z * 13) % 9) as f32 * 0.35 + 0.4;
            let pos = vec3(
                x as f32 - side as f32 * 0.5,
                h * 0.5,
                z as f32 - side as f32 * 0.5,
            );
            let transform = Mat4::from_translation(pos)
                * Mat4::from_rotation_y(((x * 31 + z * 17) % 16) as f32 * 0.1)
                * Mat4::from_scale(vec3(0.7, h, 0.7));
            instances.push(Instance::new(bvh.clone(), idx, transform));
        }
    }

    let mut tlas = Tlas::new(instances);
    tlas.scheduler = args.backend;
    {
        let _t = Timer::new("tlas build");
        match args.builder {
            Builder::Reference => tlas.build().unwrap(),
            Builder::Quick => tlas.build_quick().unwrap(),
        }
    }

    // Setup render target and camera
    let width = 1280usize;
    let height = 720usize;
    let target_size = Vec2::new(width as f32, height as f32);
    let fov = 28.0f32;
    let eye = vec3a(26.0, 18.0, 30.0);
    let look_at = vec3a(0.0, 0.0, 0.0);

    // Compute camera projection & view matrices
    let aspect_ratio = target_size.x / target_size.y;
    let proj_inv =
        Mat4::perspective_infinite_reverse_rh(fov.to_radians(), aspect_ratio, 0.01).inverse();
    let view_inv = Mat4::look_at_rh(eye.into(), look_at.into(), Vec3::Y).inverse();

    let mut fragments = vec![Vec3A::ZERO; width * height];

    // For each pixel trace a ray into the scene and write the shading normal
    // as color
    let trace_fn = |i: usize, fragment: &mut Vec3A| {
        let frag_coord = uvec2((i % width) as u32, (i / width) as u32);
        let mut screen_uv = frag_coord.as_vec2() / target_size;
        screen_uv.y = 1.0 - screen_uv.y;
        let ndc = screen_uv * 2.0 - Vec2::ONE;
        let clip_pos = vec4(ndc.x, ndc.y, 1.0, 1.0);

        let mut vs_pos = proj_inv * clip_pos;
        vs_pos /= vs_pos.w;
        let direction = (Vec3A::from((view_inv * vs_pos).xyz()) - eye).normalize();
        let mut ray = Ray::new(eye, direction);

        tlas.intersect(&mut ray);
        if ray.hit.is_hit() {
            let instance = &tlas.instances()[ray.hit.instance() as usize];
            let attrs = &instance.bvh().mesh().attrs[ray.hit.prim() as usize];
            let local = attrs.normal_at(ray.hit.u, ray.hit.v);
            let mut normal = instance
                .transform()
                .transform_vector3a(local)
                .normalize_or_zero();
            normal *= normal.dot(-ray.direction).signum(); // Double sided
            *fragment = normal * 0.5 + Vec3A::splat(0.5);
        }
    };

    {
        let _t = Timer::new("trace rays");
        args.backend.par_map(&mut fragments, &trace_fn);
    }

    // Init image buffer
    let mut img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::new(width as u32, height as u32);
    let pixels = img.as_mut();

    pixels.chunks_mut(4).enumerate().for_each(|(i, chunk)| {
        let c = (fragments[i].clamp(Vec3A::ZERO, Vec3A::ONE) * 255.0).as_uvec3();
        chunk.copy_from_slice(&[c.x as u8, c.y as u8, c.z as u8, 255]);
    });

    img.save("demoscene.png").expect("Failed to save image");
}
