//! Signal Generator Main Application
//!
//! Entry point for the STM32G474-based function generator firmware.
//! Initializes hardware, spawns the front-panel task and runs the UI loop.

#![no_std]
#![no_main]

use core::cell::RefCell;

use critical_section::Mutex;
use defmt::unwrap;
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_stm32::dac::DacCh1;
use embassy_stm32::dma::NoDma;
use embassy_stm32::flash::Flash;
use embassy_stm32::gpio::{Input, Level, Output, OutputType, Pull, Speed};
use embassy_stm32::i2c::I2c;
use embassy_stm32::peripherals::{self, DAC1};
use embassy_stm32::time::Hertz;
use embassy_stm32::timer::low_level::Timer as LowLevelTimer;
use embassy_stm32::timer::simple_pwm::PwmPin;
use embassy_stm32::{bind_interrupts, interrupt};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use {defmt_rtt as _, panic_probe as _};

use siggen_firmware::drivers::display::Display;
use siggen_firmware::hal::dac::{DacSample, SampleDac};
use siggen_firmware::hal::flash::FlashBackend;
use siggen_firmware::hal::gpio::{Buttons, StatusLed};
use siggen_firmware::hal::timer::OutputTimer;
use siggen_firmware::input::{Button, ButtonPad};
use siggen_firmware::output::{Generator, SampleBank};
use siggen_firmware::platform::STM32G474_TIM3;
use siggen_firmware::prelude::*;
use siggen_firmware::settings::SettingsStore;
use siggen_firmware::ui::{self, SettleCounter, UiAction, UiState};

// Bind interrupt handlers
bind_interrupts!(struct Irqs {
    I2C1_EV => embassy_stm32::i2c::EventInterruptHandler<peripherals::I2C1>;
    I2C1_ER => embassy_stm32::i2c::ErrorInterruptHandler<peripherals::I2C1>;
});

/// Tables replayed by the TIM3 interrupt
static BANK: SampleBank<WAVEFORM_TABLE_LEN> = SampleBank::new(DAC_MID_SCALE);

/// Digit-edit settle delay, armed by the UI, counted down by the panel task
static SETTLE: SettleCounter = SettleCounter::new();

/// DAC channel written by the TIM3 interrupt
static SAMPLE_DAC: Mutex<RefCell<Option<SampleDac<'static, DAC1>>>> =
    Mutex::new(RefCell::new(None));

/// Front-panel input for the UI loop
static EVENTS: Channel<CriticalSectionRawMutex, PanelEvent, 8> = Channel::new();

/// One UI tick elapsed
static TICK: Signal<CriticalSectionRawMutex, ()> = Signal::new();

#[derive(Clone, Copy, defmt::Format)]
enum PanelEvent {
    Press(Button),
    ResetChord,
}

type Store = SettingsStore<FlashBackend<'static>>;

/// Everything the UI loop mutates
struct App {
    ui: UiState,
    generator: Generator<WAVEFORM_TABLE_LEN>,
    store: Store,
    timer: OutputTimer<'static>,
    display: Display<'static>,
    led: StatusLed<'static>,
}

impl App {
    async fn run(&mut self, action: UiAction) {
        match action {
            UiAction::Recompute => self.recompute(),
            UiAction::SetContrast(contrast) => self.set_contrast(contrast).await,
            UiAction::Reload => {
                self.set_contrast(self.store.settings().contrast).await;
                self.recompute();
            }
        }
    }

    fn recompute(&mut self) {
        let plan = ui::recompute(&mut self.generator, &mut self.timer, &BANK, &mut self.store);
        if plan.forced_square {
            warn!("waveform forced to square");
        }
        self.led.set(self.generator.is_on());
        self.ui.invalidate();
    }

    async fn set_contrast(&mut self, contrast: u8) {
        if let Err(e) = self.display.set_contrast(contrast).await {
            warn!("display contrast failed: {}", e);
        }
    }

    async fn refresh(&mut self) {
        if !self.ui.needs_update() {
            return;
        }
        let screen = self.ui.screen(&self.generator, self.store.settings());
        if let Err(e) = self.display.show(&screen).await {
            warn!("display update failed: {}", e);
        }
        self.ui.mark_updated();
    }
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Signal Generator Firmware v{}", env!("CARGO_PKG_VERSION"));

    let config = embassy_stm32::Config::default();
    let p = embassy_stm32::init(config);

    info!("Peripherals initialized");

    let led = StatusLed::new(Output::new(p.PA5, Level::Low, Speed::Low));

    let buttons = Buttons::new(
        Input::new(p.PC0, Pull::Up),
        Input::new(p.PC1, Pull::Up),
        Input::new(p.PC2, Pull::Up),
        Input::new(p.PC3, Pull::Up),
    );

    let store = SettingsStore::open(FlashBackend::new(Flash::new_blocking(p.FLASH)));
    if let Some(e) = store.open_error() {
        warn!("settings reset to defaults: {}", e);
    }

    let i2c = I2c::new(
        p.I2C1,
        p.PB8, // SCL
        p.PB9, // SDA
        Irqs,
        p.DMA1_CH1,
        p.DMA1_CH2,
        Hertz(I2C_FREQUENCY_HZ),
        Default::default(),
    );
    let mut display = Display::new(i2c);
    if let Err(e) = display.init(store.settings().contrast).await {
        warn!("display init failed: {}", e);
    }

    let dac = SampleDac::new(DacCh1::new(p.DAC1, NoDma, p.PA4));
    critical_section::with(|cs| {
        SAMPLE_DAC.borrow_ref_mut(cs).replace(dac);
    });

    let timer = OutputTimer::new(
        LowLevelTimer::new(p.TIM3),
        PwmPin::new_ch1(p.PA6, OutputType::PushPull),
    );

    let mut generator = Generator::new(STM32G474_TIM3, store.settings().trim());
    ui::restore_settings(&mut generator, store.settings());

    let mut app = App {
        ui: UiState::new(),
        generator,
        store,
        timer,
        display,
        led,
    };
    app.recompute();

    unwrap!(spawner.spawn(panel_task(buttons)));

    info!("Tasks spawned, entering main loop");

    loop {
        match select(EVENTS.receive(), TICK.wait()).await {
            Either::First(PanelEvent::Press(button)) => {
                let action = app.ui.handle_button(
                    button,
                    &mut app.generator,
                    &mut app.store,
                    &SETTLE,
                );
                if let Some(action) = action {
                    app.run(action).await;
                }
            }
            Either::First(PanelEvent::ResetChord) => {
                let action = app.ui.reset_settings(&mut app.generator, &mut app.store);
                app.run(action).await;
            }
            Either::Second(()) => {
                if let Some(action) = app.ui.poll_settled(&SETTLE) {
                    app.run(action).await;
                }
                if let Err(e) = app.store.tick() {
                    warn!("settings commit failed: {}", e);
                }
            }
        }
        app.refresh().await;
    }
}

/// Front-panel task - samples the buttons at the UI tick rate
#[embassy_executor::task]
async fn panel_task(buttons: Buttons<'static>) {
    let mut pad = ButtonPad::new();
    let mut ticker = Ticker::every(Duration::from_millis(UI_TICK_MS));
    loop {
        ticker.next().await;

        let scan = pad.scan(buttons.levels());
        for button in scan.events {
            if EVENTS.try_send(PanelEvent::Press(button)).is_err() {
                warn!("button event dropped");
            }
        }
        if scan.reset_chord && EVENTS.try_send(PanelEvent::ResetChord).is_err() {
            warn!("reset chord dropped");
        }

        SETTLE.tick();
        TICK.signal(());
    }
}

/// TIM3 update - one sample of the active table per timer period
#[interrupt]
fn TIM3() {
    OutputTimer::clear_update_flag();
    let sample = DacSample::from_table(BANK.next_sample());
    critical_section::with(|cs| {
        if let Some(dac) = SAMPLE_DAC.borrow_ref_mut(cs).as_mut() {
            dac.write(sample);
        }
    });
}
