//! End-to-end deformation tests

use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::{DVec3, IVec3};

use super::*;
use crate::core::DeformConfig;
use crate::expression::{CompileError, EvalError};
use crate::voxel::{
    Clipboard, CuboidRegion, EllipsoidRegion, Extent, InputExtent, Region, SparseWorld, Voxel,
    VoxelGrid,
};

/// Every cell gets a distinct material so moves are traceable
fn numbered_grid(min: IVec3, max: IVec3) -> VoxelGrid {
    let size = max - min + IVec3::ONE;
    VoxelGrid::from_fn(min, max, |p| {
        let local = p - min;
        let index = local.x + local.y * size.x + local.z * size.x * size.y;
        Voxel::material((index % 250 + 1) as u8)
    })
}

fn cuboid(min: IVec3, max: IVec3) -> Arc<dyn Region> {
    Arc::new(CuboidRegion::new(min, max))
}

fn run<E: Extent>(deform: Deform<E>, ctx: EditContext) -> (Result<(), DeformError>, DeformOperation<E>) {
    let mut op = deform.into_operation(ctx);
    let result = complete(&mut op);
    (result, op)
}

#[test]
fn test_identity_raw_coordinates() {
    let max = IVec3::splat(4);
    let mut grid = numbered_grid(IVec3::ZERO, max);
    let before = grid.clone();

    let deform = Deform::new(&mut grid, cuboid(IVec3::ZERO, max), "", Mode::RawCoordinate).unwrap();
    let (result, op) = run(deform, EditContext::new());
    result.unwrap();
    assert_eq!(op.state(), OperationState::Done);
    assert_eq!(op.stats().cells_written, 125);
    drop(op);

    assert_eq!(grid, before);
}

#[test]
fn test_identity_all_modes() {
    for mode in [Mode::RawCoordinate, Mode::Offset, Mode::UnitCube] {
        let min = IVec3::new(-3, 2, 5);
        let max = IVec3::new(3, 6, 9);
        let mut grid = numbered_grid(min, max);
        let before = grid.clone();

        let deform = Deform::builder("x = x; y = y; z = z")
            .destination(&mut grid)
            .region(cuboid(min, max))
            .mode(mode)
            .offset(DVec3::new(7.0, -2.0, 1.0))
            .build()
            .unwrap();
        run(deform, EditContext::new()).0.unwrap();

        assert_eq!(grid, before, "mode {}", mode);
    }
}

#[test]
fn test_unit_cube_centering() {
    let max = IVec3::splat(4);
    let mut grid = numbered_grid(IVec3::ZERO, max);
    let center = grid.voxel(IVec3::splat(2));

    // Every cell samples normalized (0, 0, 0), which is the region center
    let deform = Deform::new(&mut grid, cuboid(IVec3::ZERO, max), "x = 0; y = 0; z = 0", Mode::UnitCube)
        .unwrap();
    run(deform, EditContext::new()).0.unwrap();

    for pos in CuboidRegion::new(IVec3::ZERO, max).cells() {
        assert_eq!(grid.voxel(pos), center);
    }
}

#[test]
fn test_unit_cube_corners() {
    let max = IVec3::splat(4);
    let mut grid = numbered_grid(IVec3::ZERO, max);
    let far_corner = grid.voxel(max);

    let deform =
        Deform::new(&mut grid, cuboid(IVec3::ZERO, max), "x = 1; y = 1; z = 1", Mode::UnitCube).unwrap();
    run(deform, EditContext::new()).0.unwrap();
    assert_eq!(grid.voxel(IVec3::ZERO), far_corner);
}

#[test]
fn test_degenerate_axis() {
    let max = IVec3::new(4, 4, 0);
    let mut grid = numbered_grid(IVec3::ZERO, max);
    let before = grid.clone();

    let deform = Deform::new(&mut grid, cuboid(IVec3::ZERO, max), "z = z * 3", Mode::UnitCube).unwrap();
    let (result, op) = run(deform, EditContext::new());
    result.unwrap();
    assert_eq!(op.stats().cells_written, 25);
    drop(op);

    // z normalizes to 0 on a flat region, so nothing moves
    assert_eq!(grid, before);
}

#[test]
fn test_translation_with_destination_input() {
    let max = IVec3::splat(2);
    let mut grid = numbered_grid(IVec3::ZERO, max);
    let before = grid.clone();

    let deform = Deform::builder("x = x + 1")
        .destination(&mut grid)
        .region(cuboid(IVec3::ZERO, max))
        .mode(Mode::Offset)
        .offset(DVec3::new(1.0, 0.0, 0.0))
        .build()
        .unwrap();
    run(deform, EditContext::new()).0.unwrap();

    // Output and input offsets cancel; the increment shifts sampling one cell
    for pos in CuboidRegion::new(IVec3::ZERO, max).cells() {
        assert_eq!(grid.voxel(pos), before.voxel(pos + IVec3::X), "at {}", pos);
    }
}

#[test]
fn test_translation_with_clipboard_input() {
    let max = IVec3::splat(2);
    let source = numbered_grid(IVec3::ZERO, max);
    let clipboard = Arc::new(Clipboard::copy_from(
        &source,
        &CuboidRegion::new(IVec3::ZERO, max),
        IVec3::ZERO,
    ));

    let mut dest = VoxelGrid::new(IVec3::ZERO, max);
    let deform = Deform::builder("x = x + 1")
        .destination(&mut dest)
        .region(cuboid(IVec3::ZERO, max))
        .mode(Mode::Offset)
        .offset(DVec3::new(1.0, 0.0, 0.0))
        .use_clipboard(true)
        .build()
        .unwrap();
    run(deform, EditContext::new().with_clipboard(clipboard)).0.unwrap();

    // Placement offset and increment cancel against the origin-anchored clipboard
    assert_eq!(dest, source);
}

#[test]
fn test_clipboard_unit_cube_rescales() {
    // 3-cell clipboard row stretched over a 5-cell destination row
    let clip_grid = VoxelGrid::from_fn(IVec3::new(10, 0, 0), IVec3::new(12, 0, 0), |p| {
        Voxel::material((p.x - 9) as u8)
    });
    let clipboard = Arc::new(Clipboard::new(clip_grid, IVec3::new(10, 0, 0)));

    let mut dest = SparseWorld::new();
    let deform = Deform::builder("")
        .destination(&mut dest)
        .region(cuboid(IVec3::ZERO, IVec3::new(4, 0, 0)))
        .mode(Mode::UnitCube)
        .use_clipboard(true)
        .build()
        .unwrap();
    run(deform, EditContext::new().with_clipboard(clipboard)).0.unwrap();

    let materials: Vec<u8> = (0..5)
        .map(|x| dest.voxel(IVec3::new(x, 0, 0)).material_id)
        .collect();
    // -1, -0.5, 0, 0.5, 1 map to 10, 10.5, 11, 11.5, 12 (ties away from zero)
    assert_eq!(materials, vec![1, 2, 2, 3, 3]);
}

#[test]
fn test_missing_clipboard_is_invalid_state() {
    let mut grid = numbered_grid(IVec3::ZERO, IVec3::ONE);
    let before = grid.clone();
    let deform = Deform::builder("")
        .destination(&mut grid)
        .region(cuboid(IVec3::ZERO, IVec3::ONE))
        .mode(Mode::RawCoordinate)
        .use_clipboard(true)
        .build()
        .unwrap();
    let (result, op) = run(deform, EditContext::new());
    assert!(matches!(result, Err(DeformError::InvalidState(_))));
    assert_eq!(op.state(), OperationState::Failed);
    drop(op);
    assert_eq!(grid, before);
}

#[test]
fn test_timeout_on_unbounded_loop() {
    let max = IVec3::splat(3);
    let mut grid = numbered_grid(IVec3::ZERO, max);

    let deform =
        Deform::new(&mut grid, cuboid(IVec3::ZERO, max), "while (1) { x = x }", Mode::RawCoordinate)
            .unwrap();
    let started = Instant::now();
    let (result, op) = run(deform, EditContext::new().with_timeout(Duration::from_millis(20)));

    match result {
        Err(DeformError::Timeout { cells_written, .. }) => assert!(cells_written < 64),
        other => panic!("expected timeout, got {:?}", other),
    }
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(op.state(), OperationState::Failed);
    assert!(op.stats().cells_written < op.stats().cells_total);
}

#[test]
fn test_timeout_between_cells() {
    let max = IVec3::new(63, 63, 15);
    let mut grid = VoxelGrid::new(IVec3::ZERO, max);
    let config = DeformConfig {
        check_interval: 1,
        ..DeformConfig::default()
    };

    // Each cell is cheap but the whole region is not
    let deform = Deform::new(
        &mut grid,
        cuboid(IVec3::ZERO, max),
        "t = 0; for (i = 1, 200) t += sin(i); x = x + t * 0",
        Mode::RawCoordinate,
    )
    .unwrap();
    let ctx = EditContext::new()
        .with_config(config)
        .with_timeout(Duration::from_millis(1));
    let (result, op) = run(deform, ctx);

    assert!(matches!(result, Err(DeformError::Timeout { .. })));
    assert!(op.stats().cells_processed < op.stats().cells_total);
}

#[test]
fn test_loop_limit_from_config() {
    let mut grid = numbered_grid(IVec3::ZERO, IVec3::ONE);
    let config = DeformConfig {
        max_loop_iterations: Some(50),
        ..DeformConfig::default()
    };
    let deform =
        Deform::new(&mut grid, cuboid(IVec3::ZERO, IVec3::ONE), "while (1) x++", Mode::RawCoordinate)
            .unwrap();
    let (result, _) = run(deform, EditContext::new().with_config(config));
    assert_eq!(
        result,
        Err(DeformError::Evaluation {
            position: IVec3::ZERO,
            source: EvalError::LoopLimitExceeded(50),
        })
    );
}

#[test]
fn test_cancel_mid_run() {
    let max = IVec3::splat(2);
    let mut grid = numbered_grid(IVec3::ZERO, max);
    let config = DeformConfig {
        cells_per_resume: Some(10),
        ..DeformConfig::default()
    };

    let deform = Deform::new(&mut grid, cuboid(IVec3::ZERO, max), "y = y + 1", Mode::RawCoordinate).unwrap();
    let mut op = deform.into_operation(EditContext::new().with_config(config));

    assert_eq!(op.resume(), Ok(Progress::Continue));
    assert_eq!(op.state(), OperationState::Running);
    assert_eq!(op.stats().cells_written, 10);

    let handle = op.cancel_handle();
    std::thread::spawn(move || handle.cancel()).join().unwrap();

    let err = op.resume().unwrap_err();
    assert_eq!(err, DeformError::Canceled { cells_written: 10 });
    assert!(!err.is_failure());
    assert_eq!(op.state(), OperationState::Canceled);

    let snapshot: VoxelGrid = (**op.destination()).clone();
    assert_eq!(op.resume(), Err(DeformError::Canceled { cells_written: 10 }));
    assert_eq!(op.stats().cells_written, 10);
    assert_eq!(**op.destination(), snapshot);
}

#[test]
fn test_cancel_before_start() {
    let mut grid = numbered_grid(IVec3::ZERO, IVec3::ONE);
    let before = grid.clone();
    let deform =
        Deform::new(&mut grid, cuboid(IVec3::ZERO, IVec3::ONE), "x = x + 1", Mode::RawCoordinate).unwrap();
    let mut op = deform.into_operation(EditContext::new());
    op.cancel();
    assert_eq!(op.resume(), Err(DeformError::Canceled { cells_written: 0 }));
    drop(op);
    assert_eq!(grid, before);
}

#[test]
fn test_construction_failure_has_no_side_effects() {
    let mut grid = numbered_grid(IVec3::ZERO, IVec3::ONE);
    let before = grid.clone();

    for source in ["x = = 1", "x = noise(x)", "break", "pi = 3"] {
        let result = Deform::new(&mut grid, cuboid(IVec3::ZERO, IVec3::ONE), source, Mode::UnitCube);
        assert!(matches!(result, Err(DeformError::Compile(_))), "{}", source);
    }

    assert_eq!(grid, before);
}

#[test]
fn test_missing_arguments() {
    let mut grid = VoxelGrid::new(IVec3::ZERO, IVec3::ONE);

    let err = Deform::<&mut VoxelGrid>::builder("")
        .region(cuboid(IVec3::ZERO, IVec3::ONE))
        .mode(Mode::UnitCube)
        .build()
        .unwrap_err();
    assert_eq!(err, DeformError::InvalidArgument("destination"));

    let err = Deform::builder("")
        .destination(&mut grid)
        .mode(Mode::UnitCube)
        .build()
        .unwrap_err();
    assert_eq!(err, DeformError::InvalidArgument("region"));

    let err = Deform::builder("")
        .destination(&mut grid)
        .region(cuboid(IVec3::ZERO, IVec3::ONE))
        .build()
        .unwrap_err();
    assert_eq!(err, DeformError::InvalidArgument("mode"));
}

#[test]
fn test_in_place_shift_reads_pre_image() {
    let max = IVec3::new(7, 0, 0);
    let mut grid = numbered_grid(IVec3::ZERO, max);
    let before = grid.clone();

    let deform = Deform::new(&mut grid, cuboid(IVec3::ZERO, max), "x = x - 1", Mode::RawCoordinate).unwrap();
    run(deform, EditContext::new()).0.unwrap();

    assert!(grid.voxel(IVec3::ZERO).is_empty());
    for x in 1..=7 {
        assert_eq!(
            grid.voxel(IVec3::new(x, 0, 0)),
            before.voxel(IVec3::new(x - 1, 0, 0))
        );
    }
}

#[test]
fn test_fractional_scale_in_place() {
    let max = IVec3::new(1, 4, 1);
    let mut grid = numbered_grid(IVec3::ZERO, max);
    let before = grid.clone();

    let deform = Deform::new(&mut grid, cuboid(IVec3::ZERO, max), "y = y * 0.5", Mode::RawCoordinate).unwrap();
    run(deform, EditContext::new()).0.unwrap();

    // 0.5 and 1.5 round away from zero
    let sampled_rows = [0, 1, 1, 2, 2];
    for pos in CuboidRegion::new(IVec3::ZERO, max).cells() {
        let source = IVec3::new(pos.x, sampled_rows[pos.y as usize], pos.z);
        assert_eq!(grid.voxel(pos), before.voxel(source), "at {}", pos);
    }
}

#[test]
fn test_deeply_nested_expression_is_rejected() {
    let mut grid = numbered_grid(IVec3::ZERO, IVec3::ONE);
    let before = grid.clone();
    let source = format!("x = {}1{}", "(".repeat(5_000), ")".repeat(5_000));

    assert!(matches!(
        Deform::new(&mut grid, cuboid(IVec3::ZERO, IVec3::ONE), &source, Mode::UnitCube),
        Err(DeformError::Compile(CompileError::NestingTooDeep { .. }))
    ));
    assert_eq!(grid, before);
}

#[test]
fn test_in_place_shift_across_resumes() {
    let max = IVec3::new(9, 1, 0);
    let mut grid = numbered_grid(IVec3::ZERO, max);
    let before = grid.clone();
    let config = DeformConfig {
        cells_per_resume: Some(3),
        ..DeformConfig::default()
    };

    let deform = Deform::new(&mut grid, cuboid(IVec3::ZERO, max), "x = x - 2", Mode::RawCoordinate).unwrap();
    let mut op = deform.into_operation(EditContext::new().with_config(config));
    let mut resumes = 0;
    while op.resume().unwrap() == Progress::Continue {
        resumes += 1;
    }
    assert_eq!(resumes, 6);
    drop(op);

    for pos in CuboidRegion::new(IVec3::ZERO, max).cells() {
        assert_eq!(grid.voxel(pos), before.voxel(pos - IVec3::new(2, 0, 0)));
    }
}

#[test]
fn test_evaluation_error_is_terminal() {
    let max = IVec3::new(4, 0, 0);
    let mut grid = numbered_grid(IVec3::ZERO, max);

    let deform =
        Deform::new(&mut grid, cuboid(IVec3::ZERO, max), "x = 1 / (x - 3)", Mode::RawCoordinate).unwrap();
    let mut op = deform.into_operation(EditContext::new());
    let err = op.resume().unwrap_err();
    assert_eq!(
        err,
        DeformError::Evaluation {
            position: IVec3::new(3, 0, 0),
            source: EvalError::DivisionByZero,
        }
    );
    assert_eq!(op.stats().cells_written, 3);
    assert_eq!(op.resume(), Err(err));
    assert_eq!(op.state(), OperationState::Failed);
}

#[test]
fn test_ellipsoid_region_only_touches_inside() {
    let max = IVec3::splat(6);
    let mut world = SparseWorld::new();
    let region: Arc<dyn Region> = Arc::new(EllipsoidRegion::new(IVec3::splat(3), DVec3::splat(2.0)));

    let deform = Deform::new(&mut world, Arc::clone(&region), "x = 0; y = 0; z = 0", Mode::UnitCube).unwrap();
    let (result, op) = run(deform, EditContext::new());
    result.unwrap();
    assert_eq!(op.stats().cells_total, region.volume());
    drop(op);

    // Sampling an empty world writes nothing visible
    assert!(world.is_empty());
    assert!(CuboidRegion::new(IVec3::ZERO, max).cells().all(|p| world.voxel(p).is_empty()));
}

#[test]
fn test_sparse_world_destination() {
    let mut world = SparseWorld::new();
    world.set_voxel(IVec3::new(0, 0, 0), Voxel::material(9));
    world.take_modified();

    let deform = Deform::new(&mut world, cuboid(IVec3::ZERO, IVec3::new(3, 0, 0)), "x = 0", Mode::RawCoordinate)
        .unwrap();
    run(deform, EditContext::new()).0.unwrap();

    for x in 0..=3 {
        assert_eq!(world.voxel(IVec3::new(x, 0, 0)), Voxel::material(9));
    }
    assert_eq!(world.len(), 4);
}

#[test]
fn test_context_region_override() {
    let max = IVec3::splat(3);
    let mut grid = numbered_grid(IVec3::ZERO, max);
    let before = grid.clone();

    let deform = Deform::new(&mut grid, cuboid(IVec3::ZERO, max), "x = x + 1", Mode::RawCoordinate).unwrap();
    let ctx = EditContext::new().with_region(cuboid(IVec3::ZERO, IVec3::new(0, 3, 3)));
    let (result, op) = run(deform, ctx);
    result.unwrap();
    assert_eq!(op.stats().cells_total, 16);
    drop(op);

    for pos in CuboidRegion::new(IVec3::ZERO, max).cells() {
        let expected = if pos.x == 0 { before.voxel(pos + IVec3::X) } else { before.voxel(pos) };
        assert_eq!(grid.voxel(pos), expected);
    }
}

#[test]
fn test_player_placement_requires_position() {
    let mut grid = numbered_grid(IVec3::ZERO, IVec3::ONE);
    let deform = Deform::builder("")
        .destination(&mut grid)
        .region(cuboid(IVec3::ZERO, IVec3::ONE))
        .mode(Mode::Offset)
        .placement(Placement::new(PlacementType::Player, IVec3::ZERO))
        .build()
        .unwrap();
    let (result, _) = run(deform, EditContext::new());
    assert_eq!(result, Err(DeformError::InvalidArgument("player position")));
}

#[test]
fn test_player_placement_anchors_offset_mode() {
    let max = IVec3::new(4, 0, 0);
    let mut grid = numbered_grid(IVec3::ZERO, max);
    let anchor = grid.voxel(IVec3::new(2, 0, 0));

    // Offset mode exposes coordinates relative to the player; x = 0 samples the player cell
    let deform = Deform::builder("x = 0")
        .destination(&mut grid)
        .region(cuboid(IVec3::ZERO, max))
        .mode(Mode::Offset)
        .placement(Placement::new(PlacementType::Player, IVec3::ZERO))
        .build()
        .unwrap();
    let ctx = EditContext::new().with_player_position(IVec3::new(2, 0, 0));
    run(deform, ctx).0.unwrap();

    for x in 0..=4 {
        assert_eq!(grid.voxel(IVec3::new(x, 0, 0)), anchor);
    }
}

#[test]
#[allow(deprecated)]
fn test_deprecated_offset_accessor() {
    let mut grid = VoxelGrid::new(IVec3::ZERO, IVec3::ONE);
    let mut deform = Deform::new(&mut grid, cuboid(IVec3::ZERO, IVec3::ONE), "", Mode::Offset).unwrap();
    assert!(matches!(deform.offset(), Err(DeformError::InvalidState(_))));

    deform.set_offset(DVec3::new(1.4, 2.6, -3.5));
    assert_eq!(deform.offset(), Ok(DVec3::new(1.0, 3.0, -4.0)));

    deform.set_placement(Placement::new(PlacementType::Center, IVec3::ZERO));
    assert!(deform.offset().is_err());
}

#[test]
fn test_mutators() {
    let mut grid = VoxelGrid::new(IVec3::ZERO, IVec3::ONE);
    let mut deform = Deform::new(&mut grid, cuboid(IVec3::ZERO, IVec3::ONE), "y = -y", Mode::Offset).unwrap();

    deform.set_mode(Mode::RawCoordinate);
    deform.set_region(cuboid(IVec3::ZERO, IVec3::splat(5)));
    deform.set_use_clipboard(true);
    assert_eq!(deform.mode(), Mode::RawCoordinate);
    assert_eq!(deform.region().volume(), 216);
    assert!(deform.use_clipboard());
    assert_eq!(deform.expression().source(), "y = -y");
}

#[test]
fn test_display_and_status() {
    let mut grid = VoxelGrid::new(IVec3::ZERO, IVec3::ONE);
    let deform = Deform::new(&mut grid, cuboid(IVec3::ZERO, IVec3::ONE), "y = y * 2", Mode::UnitCube).unwrap();
    assert_eq!(deform.to_string(), "deformation of y = y * 2");

    let op = deform.into_operation(EditContext::new());
    let messages = op.status_messages();
    assert_eq!(
        messages,
        vec![StatusMessage {
            key: "operation.deform.expression",
            text: "y = y * 2".to_string(),
        }]
    );
    assert_eq!(op.state(), OperationState::Ready);
}

#[test]
fn test_factory_is_reusable() {
    let max = IVec3::new(3, 0, 0);
    let grid = numbered_grid(IVec3::ZERO, max);
    let deform = Deform::new(grid.clone(), cuboid(IVec3::ZERO, max), "x = x + 1", Mode::RawCoordinate).unwrap();

    let mut first = deform.create_operation(EditContext::new());
    complete(&mut first).unwrap();
    let mut second = deform.create_operation(EditContext::new());
    complete(&mut second).unwrap();

    assert_eq!(first.destination(), second.destination());
    assert_eq!(deform.destination(), &grid);
    assert_eq!(first.into_destination().voxel(IVec3::ZERO), grid.voxel(IVec3::X));
}
