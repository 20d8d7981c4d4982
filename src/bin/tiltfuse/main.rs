#![no_main]
#![no_std]

#[rtic::app(device = stm32f4xx_hal::pac, peripherals = true, dispatchers = [SPI2])]
mod app {
    use core::fmt::Write;
    use cortex_m::asm;
    use panic_write::PanicHandler;
    use stm32f4xx_hal::{
        gpio::{Input, Pin, PullDown, PB8, PB9},
        i2c::{I2c, Mode as i2cMode},
        pac::{I2C1, USART2},
        prelude::*,
        serial::{Config, Serial, Tx},
    };
    use systick_monotonic::{fugit::Duration, Systick};
    use tiltfuse::drivers::imu::mpu6050::Mpu6050;
    use tiltfuse::estimation::motion::{MotionEstimator, MotionState};
    use tiltfuse::filtering::kalman::KalmanConfig;

    const POLL_PERIOD_MS: u64 = 50;
    const RESET_SETTLE_MS: u64 = 300; // button debounce

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        tx: core::pin::Pin<panic_write::PanicHandler<Tx<USART2>>>,
        imu: Mpu6050<I2c<I2C1, (PB8, PB9)>>,
        reset_button: Pin<'A', 0, Input<PullDown>>,
        estimator: MotionEstimator,
        state: MotionState,
    }

    #[monotonic(binds = SysTick, default = true)]
    type MonoTimer = Systick<1000>;

    #[init]
    fn init(ctx: init::Context) -> (Shared, Local, init::Monotonics) {
        // configure clocks
        let rcc = ctx.device.RCC.constrain();
        let mono = Systick::new(ctx.core.SYST, 48_000_000);
        let clocks = rcc.cfgr.sysclk(48.MHz()).freeze();

        // configure I2C
        let gpiob = ctx.device.GPIOB.split();
        let scl = gpiob.pb8;
        let sda = gpiob.pb9;
        let i2c = I2c::new(
            ctx.device.I2C1,
            (scl, sda),
            i2cMode::Standard {
                frequency: 100.kHz(),
            },
            &clocks,
        );

        // set up uart tx
        let gpioa = ctx.device.GPIOA.split();
        let tx_pin = gpioa.pa2.into_alternate();
        let serial = Serial::tx(
            ctx.device.USART2,
            tx_pin,
            Config::default()
                .baudrate(115200.bps())
                .wordlength_8()
                .parity_none(),
            &clocks,
        )
        .unwrap();
        let mut tx = PanicHandler::new(serial);

        // displacement reset button, active high
        let reset_button = gpioa.pa0.into_pull_down_input();

        // wake the IMU
        let mut imu = Mpu6050::new(i2c);
        if let Err(_) = imu.init() {
            writeln!(tx, "imu wake-up failed\r").unwrap();
            panic!("imu wake-up failed");
        }

        let estimator =
            MotionEstimator::new(KalmanConfig::default(), monotonics::now().ticks() as u32);

        writeln!(tx, "system initialized\r").unwrap();

        poll::spawn_after(Duration::<u64, 1, 1000>::millis(POLL_PERIOD_MS)).unwrap();

        (
            Shared {},
            Local {
                tx,
                imu,
                reset_button,
                estimator,
                state: MotionState::default(),
            },
            init::Monotonics(mono),
        )
    }

    #[task(local = [tx, imu, reset_button, estimator, state])]
    fn poll(cx: poll::Context) {
        let now_ms = monotonics::now().ticks() as u32;
        let mut settle = false;

        // a failed read skips output for this cycle; retry on the next poll
        if let Ok(_) = cx
            .local
            .estimator
            .run_cycle(cx.local.imu, cx.local.state, now_ms)
        {
            if cx.local.reset_button.is_high() {
                cx.local.state.reset_displacement();
                writeln!(cx.local.tx, "Origin set to (0, 0, 0)\r").unwrap();
                settle = true;
            }

            writeln!(
                cx.local.tx,
                "Pitch: {:.1}°, Roll: {:.1}°, X: {:.3} m, Y: {:.3} m, Z: {:.3} m\r",
                cx.local.state.pitch,
                cx.local.state.roll,
                cx.local.state.position.0,
                cx.local.state.position.1,
                cx.local.state.position.2,
            )
            .unwrap();
        }

        let delay = if settle {
            POLL_PERIOD_MS + RESET_SETTLE_MS
        } else {
            POLL_PERIOD_MS
        };
        poll::spawn_after(Duration::<u64, 1, 1000>::millis(delay)).unwrap();
    }

    #[idle]
    fn idle(_ctx: idle::Context) -> ! {
        loop {
            asm::nop();
        }
    }
}
