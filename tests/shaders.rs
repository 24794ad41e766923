//! WGSL validation of the generated shader modules.
//!
//! Parses and validates with naga, then checks the resource bindings against
//! the bind group layouts the pipelines are built with.

use sparkfield::shaders::{compute_shader_source, render_shader_source};

fn validate_wgsl(code: &str) -> naga::Module {
    let module = match naga::front::wgsl::parse_str(code) {
        Ok(module) => module,
        Err(e) => panic!("WGSL parse error:\n{}", e.emit_to_string(code)),
    };

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    if let Err(e) = validator.validate(&module) {
        panic!("WGSL validation error:\n{}", e.emit_to_string(code));
    }
    module
}

/// `(group, binding, name, address space)` of every global resource.
fn bindings(module: &naga::Module) -> Vec<(u32, u32, String, naga::AddressSpace)> {
    let mut out: Vec<_> = module
        .global_variables
        .iter()
        .filter_map(|(_, var)| {
            var.binding.as_ref().map(|b| {
                (
                    b.group,
                    b.binding,
                    var.name.clone().unwrap_or_default(),
                    var.space,
                )
            })
        })
        .collect();
    out.sort_by_key(|(g, b, _, _)| (*g, *b));
    out
}

#[test]
fn test_compute_bindings() {
    let module = validate_wgsl(&compute_shader_source());
    let found: Vec<(u32, u32, String)> = bindings(&module)
        .into_iter()
        .map(|(g, b, name, _)| (g, b, name))
        .collect();
    let expected = [
        (0, 0, "globals"),
        (1, 0, "particles"),
        (1, 1, "heads"),
        (1, 2, "lists"),
        (2, 0, "sim"),
        (2, 1, "staticSim"),
        (2, 2, "attractors"),
    ];
    assert_eq!(found.len(), expected.len());
    for ((g, b, name), (eg, eb, ename)) in found.iter().zip(expected.iter()) {
        assert_eq!((*g, *b, name.as_str()), (*eg, *eb, *ename));
    }
}

#[test]
fn test_attractors_are_read_only() {
    let module = validate_wgsl(&compute_shader_source());
    let attractors = bindings(&module)
        .into_iter()
        .find(|(_, _, name, _)| name == "attractors")
        .expect("attractors binding");
    match attractors.3 {
        naga::AddressSpace::Storage { access } => {
            assert!(access.contains(naga::StorageAccess::LOAD));
            assert!(!access.contains(naga::StorageAccess::STORE));
        }
        other => panic!("unexpected address space {:?}", other),
    }
}

#[test]
fn test_render_bindings() {
    let module = validate_wgsl(&render_shader_source());
    let found: Vec<(u32, u32, String)> = bindings(&module)
        .into_iter()
        .map(|(g, b, name, _)| (g, b, name))
        .collect();
    assert_eq!(
        found,
        vec![
            (0, 0, "globals".to_string()),
            (1, 0, "particles".to_string()),
            (2, 0, "spriteSampler".to_string()),
            (2, 1, "spriteTexture".to_string()),
            (2, 2, "renderUniforms".to_string()),
        ]
    );
}

#[test]
fn test_render_particles_are_read_only() {
    let module = validate_wgsl(&render_shader_source());
    let particles = bindings(&module)
        .into_iter()
        .find(|(_, _, name, _)| name == "particles")
        .expect("particles binding");
    assert_eq!(
        particles.3,
        naga::AddressSpace::Storage {
            access: naga::StorageAccess::LOAD
        }
    );
}
