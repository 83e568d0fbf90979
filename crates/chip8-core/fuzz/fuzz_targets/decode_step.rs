#![no_main]

use chip8_core::{
    step_one, CoreConfig, Decoder, Key, MachineState, Peripherals, RandomSource,
};
use libfuzzer_sys::fuzz_target;

struct CountingRandom(u8);

impl RandomSource for CountingRandom {
    fn next_byte(&mut self) -> u8 {
        self.0 = self.0.wrapping_add(1);
        self.0
    }
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    let word = u16::from_be_bytes([data[0], data[1]]);
    let _ = Decoder::decode(word);

    let mut state = MachineState::default();
    state.load_program(&data[..2]).expect("two bytes fit");

    let mut random = CountingRandom(data[2]);
    let mut peripherals = Peripherals::with_random(&mut random);
    let config = CoreConfig::default();
    let _ = step_one(&mut state, &mut peripherals, &config);

    if let Some(key) = Key::new(data[2] & 0x0F) {
        let _ = chip8_core::key_pressed(&mut state, key);
        let _ = step_one(&mut state, &mut peripherals, &config);
    }
});
