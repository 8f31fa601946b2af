use dotmatrix::timer::Timer;

#[test]
fn div_is_the_upper_counter_byte() {
    let mut timer = Timer::new();
    let mut if_reg = 0;
    timer.tick(512, &mut if_reg);
    assert_eq!(timer.read(0xFF04), 2);
    assert_eq!(if_reg, 0);
}

#[test]
fn tima_increments_on_the_selected_falling_edge() {
    let mut timer = Timer::new();
    let mut if_reg = 0;
    timer.write(0xFF07, 0x05, &mut if_reg); // enabled, bit 3 (every 16 cycles)
    timer.tick(256, &mut if_reg);
    assert_eq!(timer.tima, 16);
    assert_eq!(if_reg, 0);
}

#[test]
fn disabled_timer_never_ticks() {
    let mut timer = Timer::new();
    let mut if_reg = 0;
    timer.write(0xFF07, 0x01, &mut if_reg); // selector set, enable clear
    timer.tick(4096, &mut if_reg);
    assert_eq!(timer.tima, 0);
}

#[test]
fn overflow_reloads_from_tma_and_requests_an_interrupt() {
    let mut timer = Timer::new();
    let mut if_reg = 0;
    timer.write(0xFF07, 0x05, &mut if_reg);
    timer.write(0xFF06, 0x42, &mut if_reg);
    timer.write(0xFF05, 0xFF, &mut if_reg);
    timer.tick(16, &mut if_reg);
    assert_eq!(timer.tima, 0x42);
    assert_eq!(if_reg & 0x04, 0x04);
}

#[test]
fn div_reset_can_clock_tima() {
    let mut timer = Timer::new();
    let mut if_reg = 0;
    timer.write(0xFF07, 0x05, &mut if_reg);
    timer.tick(8, &mut if_reg); // selected bit is now high
    assert_eq!(timer.tima, 0);
    timer.write(0xFF04, 0, &mut if_reg); // reset drops it: falling edge
    assert_eq!(timer.tima, 1);
    assert_eq!(timer.read(0xFF04), 0);
}

#[test]
fn tac_reads_back_with_unused_bits_set() {
    let mut timer = Timer::new();
    let mut if_reg = 0;
    timer.write(0xFF07, 0x05, &mut if_reg);
    assert_eq!(timer.read(0xFF07), 0xF8 | 0x05);
}
