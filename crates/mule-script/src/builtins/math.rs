use crate::builtins::want_args;
use crate::interp::Interp;
use crate::native::Native;
use crate::value::{EvalResult, Value};

pub struct Math;

impl Native for Math {
	fn type_name(&self) -> &'static str {
		"Math"
	}

	fn get(&self, name: &str) -> Option<Value> {
		match name {
			"PI" => Some(Value::Float(std::f64::consts::PI)),
			"E" => Some(Value::Float(std::f64::consts::E)),
			_ => None,
		}
	}

	fn call(&self, name: &str, args: &[Value], _interp: &mut Interp) -> Option<EvalResult> {
		let unary = |f: fn(f64) -> f64| -> EvalResult {
			want_args(&format!("Math.{name}"), 1, args)?;
			Ok(Value::Float(f(args[0].as_number_lossy())))
		};
		let result = match name {
			"abs" => unary(f64::abs),
			"acos" => unary(f64::acos),
			"asin" => unary(f64::asin),
			"atan" => unary(f64::atan),
			"cbrt" => unary(f64::cbrt),
			"ceil" => unary(f64::ceil),
			"cos" => unary(f64::cos),
			"exp" => unary(f64::exp),
			"floor" => unary(f64::floor),
			"log" => unary(f64::ln),
			"log10" => unary(f64::log10),
			"log2" => unary(f64::log2),
			"round" => unary(f64::round),
			"sign" => unary(f64::signum),
			"sin" => unary(f64::sin),
			"sqrt" => unary(f64::sqrt),
			"tan" => unary(f64::tan),
			"trunc" => unary(f64::trunc),
			"atan2" => (|| {
				want_args("Math.atan2", 2, args)?;
				Ok(Value::Float(
					args[0].as_number_lossy().atan2(args[1].as_number_lossy()),
				))
			})(),
			"pow" => (|| {
				want_args("Math.pow", 2, args)?;
				Ok(Value::Float(
					args[0].as_number_lossy().powf(args[1].as_number_lossy()),
				))
			})(),
			"max" => Ok(Value::Float(
				args
					.iter()
					.map(|v| v.as_number_lossy())
					.fold(f64::NEG_INFINITY, f64::max),
			)),
			"min" => Ok(Value::Float(
				args
					.iter()
					.map(|v| v.as_number_lossy())
					.fold(f64::INFINITY, f64::min),
			)),
			"random" => Ok(Value::Float(rand::random::<f64>())),
			_ => return None,
		};
		Some(result)
	}
}
