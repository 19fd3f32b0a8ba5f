//! Integration tests for the full simulator.

use os_simulator::common::{ErrorKind, SimError, Word};
use os_simulator::config::Config;
use os_simulator::isa::opcodes::{ArithmeticOp, BranchOp, IoOp, JumpOp};
use os_simulator::isa::{Format, Instruction};
use os_simulator::kernel::pcb::BufferSizes;
use os_simulator::kernel::{ProcessId, ProcessState};
use os_simulator::sim::loader::{parse_program, JobImage};
use os_simulator::sim::Simulator;
use std::sync::atomic::Ordering;

/// Creates a minimal configuration for testing.
fn create_config(cpus: usize) -> Config {
    let mut config = Config::default();
    config.cpu.count = cpus;
    config
}

fn output_only(words: usize) -> BufferSizes {
    BufferSizes {
        input_words: 0,
        output_words: words,
        temp_words: 0,
    }
}

/// Tests a single job that computes a value and writes it to its output buffer.
#[test]
fn test_single_job_writes_output() {
    let sim = Simulator::new(create_config(1)).unwrap();
    let program = [
        Instruction::branch(BranchOp::Movi, 0, 0, 5),
        Instruction::branch(BranchOp::Addi, 0, 0, 3),
        Instruction::io(IoOp::Wr, 0, 0, 16),
        Instruction::jump(JumpOp::Hlt, 0),
    ];
    let job = JobImage::from_instructions(ProcessId::new(1), 0, &program, output_only(4));
    let pcb = sim.load_job(&job).unwrap();

    let summary = sim.run().unwrap();

    assert_eq!(pcb.state(), ProcessState::Ended);
    assert_eq!(pcb.output_word(0).unwrap(), Some(Word::new(0x0000_0008)));
    assert_eq!(summary.total_completed(), 1);
    assert_eq!(summary.jobs_completed, vec![(1, 1)]);
    assert_eq!(summary.initial_frames, 2);
    assert!(sim.kernel().is_empty());
    assert_eq!(pcb.page_table().mapped_count(), 0);
    assert_eq!(sim.ram().pool().len(), sim.ram().frame_count());
    assert!(sim.stats().instructions_executed.load(Ordering::Relaxed) >= 4);

    let rows = sim.stats().rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].job_id, "1");
    assert_eq!(rows[0].cpu_id, 1);
    assert!(rows[0].io_operations >= 2);

    let ram_dump = sim.dump().ram_dump();
    assert!(ram_dump.contains("// JOB 1 [processed by cpu_1]"));
    assert!(ram_dump.contains(" 0x00000008 (OUTPUT BUFFER START)"));
    assert!(!sim.dump().disk_dump().is_empty());
}

/// Tests that a job longer than the initial load pages in the rest on demand.
#[test]
fn test_page_fault_loads_remaining_pages() {
    let sim = Simulator::new(create_config(1)).unwrap();
    let mut program: Vec<Instruction> = (0..18)
        .map(|i| Instruction::branch(BranchOp::Movi, 0, (i % 16) as u8, i))
        .collect();
    program.push(Instruction::jump(JumpOp::Hlt, 0));
    let job = JobImage::from_instructions(ProcessId::new(2), 0, &program, BufferSizes::default());
    assert_eq!(job.words.len(), 19);
    let pcb = sim.load_job(&job).unwrap();

    let summary = sim.run().unwrap();

    assert_eq!(summary.total_completed(), 1);
    assert_eq!(summary.initial_frames, 4);
    assert_eq!(pcb.state(), ProcessState::Ended);
    assert!(pcb.page_faults() >= 1);
    assert!(sim.stats().page_faults.load(Ordering::Relaxed) >= 1);
    assert_eq!(pcb.cpu_state().regs.read(1).unwrap(), 17);
    assert_eq!(pcb.cpu_state().pc, 19);
}

/// Tests arithmetic, branching and a counted loop.
#[test]
fn test_loop_sums_into_output() {
    let sim = Simulator::new(create_config(1)).unwrap();
    // r1 = 0; r2 = 4; loop: r1 += r2; r2 -= 1; bnz r2 -> loop; wr r1 -> output[0]
    let program = [
        Instruction::branch(BranchOp::Movi, 0, 1, 0),
        Instruction::branch(BranchOp::Movi, 0, 2, 4),
        Instruction::branch(BranchOp::Movi, 0, 3, 1),
        Instruction::arithmetic(ArithmeticOp::Add, 1, 2, 1),
        Instruction::arithmetic(ArithmeticOp::Sub, 2, 3, 2),
        Instruction::branch(BranchOp::Bnz, 2, 0, 12),
        Instruction::io(IoOp::Wr, 1, 1, 32),
        Instruction::jump(JumpOp::Hlt, 0),
    ];
    let job = JobImage::from_instructions(ProcessId::new(3), 0, &program, output_only(4));
    let pcb = sim.load_job(&job).unwrap();

    sim.run().unwrap();

    assert_eq!(pcb.output_word(0).unwrap(), Some(Word::new(10)));
    assert_eq!(pcb.cpu_state().regs.read(2).unwrap(), 0);
}

/// Tests that many jobs on several CPUs all complete.
#[test]
fn test_multi_cpu_run() {
    let sim = Simulator::new(create_config(4)).unwrap();
    let mut pcbs = Vec::new();
    for id in 1..=12u32 {
        let mut program: Vec<Instruction> = (0..id)
            .map(|i| Instruction::branch(BranchOp::Addi, 0, 1, i))
            .collect();
        let output_start = id + 2;
        program.push(Instruction::io(IoOp::Wr, 1, 1, output_start * 4));
        program.push(Instruction::jump(JumpOp::Hlt, 0));
        let job = JobImage::from_instructions(ProcessId::new(id), 12 - id, &program, output_only(1));
        pcbs.push((id, sim.load_job(&job).unwrap()));
    }

    let summary = sim.run().unwrap();

    assert_eq!(summary.total_completed(), 12);
    assert_eq!(summary.jobs_completed.len(), 4);
    assert_eq!(sim.stats().rows().len(), 12);
    assert!(sim.kernel().is_empty());
    for (id, pcb) in &pcbs {
        let expected: u32 = (0..*id).sum();
        assert_eq!(pcb.state(), ProcessState::Ended);
        assert_eq!(pcb.output_word(0).unwrap(), Some(Word::new(expected)), "job {}", id);
        assert!(pcb.assigned_cpu().is_some());
    }
    assert_eq!(sim.ram().pool().len(), sim.ram().frame_count());
}

/// Tests that an illegal opcode aborts the run with a decode error.
#[test]
fn test_illegal_opcode_aborts_run() {
    let sim = Simulator::new(create_config(2)).unwrap();
    let bad = Instruction {
        format: Format::Jump,
        opcode: 0x3f,
        ..Default::default()
    };
    let program = [Instruction::branch(BranchOp::Movi, 0, 1, 1), bad];
    let job = JobImage::from_instructions(ProcessId::new(9), 0, &program, BufferSizes::default());
    sim.load_job(&job).unwrap();

    let err = sim.run().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

/// Tests that division by zero aborts the run with an execution error.
#[test]
fn test_divide_by_zero_aborts_run() {
    let sim = Simulator::new(create_config(1)).unwrap();
    let program = [
        Instruction::branch(BranchOp::Movi, 0, 1, 7),
        Instruction::arithmetic(ArithmeticOp::Div, 1, 2, 3),
        Instruction::jump(JumpOp::Hlt, 0),
    ];
    let job = JobImage::from_instructions(ProcessId::new(4), 0, &program, BufferSizes::default());
    sim.load_job(&job).unwrap();

    let err = sim.run().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Execution);
}

/// Tests that a job larger than the cache is refused at load time.
#[test]
fn test_oversized_job_rejected() {
    let sim = Simulator::new(create_config(1)).unwrap();
    let program = vec![Instruction::jump(JumpOp::Hlt, 0); 80];
    let job = JobImage::from_instructions(ProcessId::new(1), 0, &program, BufferSizes::default());
    let err = sim.load_job(&job).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Load);
    assert!(sim.kernel().is_empty());
}

/// Tests a program parsed from text under each scheduling policy.
#[test]
fn test_text_program_all_policies() {
    let text = "\
// JOB 1 3 2
0x4B010007
0x4B020003
0x92000000
// Data 0 1 0
0x00000000
// END
// JOB 2 2 1
0x4B010009
0x92000000
// Data 0 1 0
0x00000000
// END
";
    for policy in ["FIFO", "SJF", "Priority"] {
        let mut config = create_config(2);
        config.scheduling.policy = policy.to_string();
        let sim = Simulator::new(config).unwrap();
        let jobs = parse_program(text).unwrap();
        assert_eq!(sim.load_program(&jobs).unwrap(), 2);

        let summary = sim.run().unwrap();
        assert_eq!(summary.total_completed(), 2, "policy {}", policy);
        assert!(sim.kernel().is_empty());
    }
}

/// Tests the bundled sample program end to end.
#[test]
fn test_sample_program_file() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("programs/sample.txt");
    let jobs = os_simulator::sim::loader::load_program(&path).unwrap();
    assert_eq!(jobs.len(), 2);

    let sim = Simulator::new(create_config(2)).unwrap();
    let pcbs: Vec<_> = jobs.iter().map(|job| sim.load_job(job).unwrap()).collect();
    let summary = sim.run().unwrap();

    assert_eq!(summary.total_completed(), 2);
    assert_eq!(pcbs[0].output_word(0).unwrap(), Some(Word::new(10)));
    assert_eq!(pcbs[1].output_word(0).unwrap(), Some(Word::new(8)));
}

/// Builds a job of `count` register loads followed by a halt.
fn straight_line_job(id: u32, count: u32) -> JobImage {
    let mut program: Vec<Instruction> = (0..count)
        .map(|i| Instruction::branch(BranchOp::Movi, 0, (i % 16) as u8, i))
        .collect();
    program.push(Instruction::jump(JumpOp::Hlt, 0));
    JobImage::from_instructions(ProcessId::new(id), 0, &program, BufferSizes::default())
}

/// Tests that a job with more pages than RAM has frames is refused at load time.
#[test]
fn test_job_larger_than_ram_rejected() {
    let mut config = create_config(1);
    config.memory.ram_words = 16;
    let sim = Simulator::new(config).unwrap();
    let job = straight_line_job(1, 22);
    assert_eq!(job.words.len(), 23);

    let err = sim.load_job(&job).unwrap_err();
    assert!(matches!(
        err,
        SimError::OutOfFrames {
            requested: 6,
            frames: 4
        }
    ));
    assert!(sim.kernel().is_empty());
}

/// Tests that jobs which together outgrow RAM end the run with an error.
#[test]
fn test_frame_starvation_aborts_run() {
    let mut config = create_config(1);
    config.memory.ram_words = 16;
    config.memory.initial_load_pages = 2;
    let sim = Simulator::new(config).unwrap();
    sim.load_job(&straight_line_job(1, 10)).unwrap();
    sim.load_job(&straight_line_job(2, 10)).unwrap();

    let err = sim.run().unwrap_err();
    assert!(matches!(err, SimError::FrameStarvation { frames: 4, .. }));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

/// Tests a maximum-size job when the page size does not divide the job limit.
#[test]
fn test_max_job_with_uneven_page_size() {
    let mut config = create_config(1);
    config.memory.page_size = 5;
    let sim = Simulator::new(config).unwrap();
    let job = straight_line_job(7, 71);
    assert_eq!(job.words.len(), sim.config().memory.max_job_words);
    let pcb = sim.load_job(&job).unwrap();

    let summary = sim.run().unwrap();

    assert_eq!(summary.total_completed(), 1);
    assert_eq!(pcb.state(), ProcessState::Ended);
    assert_eq!(pcb.cpu_state().pc, 72);
    assert_eq!(pcb.cpu_state().regs.read(6).unwrap(), 70);
}
