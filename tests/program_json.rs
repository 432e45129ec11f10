use brixel::{
    BlendEngine, BufferId, BufferPool, FilterProgram, PixelBuffer, PixelFormat, RenderOp,
};

fn mask(id: u64, w: u32, h: u32, fill: u8) -> PixelBuffer {
    PixelBuffer::from_vec(
        BufferId(id),
        w,
        h,
        PixelFormat::Alpha,
        vec![fill; (w * h) as usize],
    )
    .unwrap()
}

#[test]
fn json_program_runs_against_a_pool() {
    let json = r#"{
        "steps": [
            { "input": 1, "output": 2, "draw": { "op": "copy" } },
            { "input": 1, "output": 2, "draw": { "op": "add", "offset_x": 1 } }
        ]
    }"#;
    let program: FilterProgram = serde_json::from_str(json).unwrap();
    assert_eq!(program.steps.len(), 2);
    assert_eq!(program.steps[0].draw.op, RenderOp::Copy);

    let mut pool = BufferPool::new();
    pool.insert(mask(1, 4, 1, 30));
    pool.insert(mask(2, 4, 1, 0));

    let engine = BlendEngine::default();
    program.run(&engine, &mut pool).unwrap();

    let out = pool.get(BufferId(2)).unwrap();
    // Step 1 copies 30 everywhere; step 2 adds 30 to columns 1..4.
    assert_eq!(out.alpha_at(0, 0), 30);
    assert_eq!(out.alpha_at(1, 0), 60);
    assert_eq!(out.alpha_at(3, 0), 60);
}

#[test]
fn fill_modes_and_tints_survive_serde() {
    let json = r#"{
        "steps": [
            {
                "input": 7,
                "output": 8,
                "draw": {
                    "fill": { "x": "repeat", "y": "stretch" },
                    "op": "blend",
                    "tint": { "r": 255, "g": 0, "b": 0, "a": 255 },
                    "offset_x": -3,
                    "clip": { "x": 0, "y": 0, "w": 10, "h": 10 }
                }
            }
        ]
    }"#;
    let program: FilterProgram = serde_json::from_str(json).unwrap();
    let step = &program.steps[0];
    assert_eq!(step.input, BufferId(7));
    assert_eq!(step.draw.fill.x, brixel::AxisFill::Repeat);
    assert_eq!(step.draw.fill.y, brixel::AxisFill::Stretch);
    assert_eq!(step.draw.offset_x, -3);
    assert_eq!(step.draw.tint.r, 255);
    assert_eq!(step.draw.clip.unwrap().w, 10);

    let round: FilterProgram =
        serde_json::from_str(&serde_json::to_string(&program).unwrap()).unwrap();
    assert_eq!(round, program);
}

#[test]
fn failing_step_aborts_but_earlier_results_stick() {
    let json = r#"{
        "steps": [
            { "input": 1, "output": 2, "draw": { "op": "copy" } },
            { "input": 1, "output": 99, "draw": { "op": "copy" } }
        ]
    }"#;
    let program: FilterProgram = serde_json::from_str(json).unwrap();

    let mut pool = BufferPool::new();
    pool.insert(mask(1, 2, 2, 77));
    pool.insert(mask(2, 2, 2, 0));

    let engine = BlendEngine::default();
    assert!(program.run(&engine, &mut pool).is_err());
    assert!(pool.get(BufferId(2)).unwrap().data.iter().all(|&b| b == 77));
}
