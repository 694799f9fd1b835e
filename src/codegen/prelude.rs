//! Fixed runtime prelude emitted verbatim at the top of every generated
//! translation unit. Checked into the repo as source text rather than
//! generated, matching the idiom used throughout the rest of the
//! pipeline for fixed scaffolding.

pub const PRELUDE: &str = r#"// Generated by glintc. Do not edit by hand.
#include <any>
#include <cmath>
#include <cstdint>
#include <functional>
#include <iostream>
#include <optional>
#include <stdexcept>
#include <string>
#include <vector>

namespace Std {
namespace IO {
inline void print(const std::string& s) { std::cout << s << std::endl; }
inline std::string readLine() {
    std::string line;
    std::getline(std::cin, line);
    return line;
}
} // namespace IO

namespace Math {
inline double sqrt(double x) { return std::sqrt(x); }
inline double abs(double x) { return std::fabs(x); }
inline double pow(double base, double exponent) { return std::pow(base, exponent); }
} // namespace Math

namespace Parse {
inline std::optional<int64_t> intValue(const std::string& s) {
    try {
        size_t consumed = 0;
        int64_t value = std::stoll(s, &consumed);
        if (consumed != s.size()) return std::nullopt;
        return value;
    } catch (...) {
        return std::nullopt;
    }
}
inline std::optional<double> floatValue(const std::string& s) {
    try {
        size_t consumed = 0;
        double value = std::stod(s, &consumed);
        if (consumed != s.size()) return std::nullopt;
        return value;
    } catch (...) {
        return std::nullopt;
    }
}
} // namespace Parse

namespace String {
inline int64_t length(const std::string& s) { return static_cast<int64_t>(s.size()); }
} // namespace String

namespace Array {
template <typename T>
int64_t length(const std::vector<T>& v) { return static_cast<int64_t>(v.size()); }
} // namespace Array
} // namespace Std

template <typename T>
std::string glint_to_string(const T& value) {
    if constexpr (std::is_same_v<T, std::string>) {
        return value;
    } else if constexpr (std::is_same_v<T, bool>) {
        return value ? "true" : "false";
    } else {
        return std::to_string(value);
    }
}

// Lets `+` concatenate a String with any other value, matching the
// checker's "either side String" rule. Non-template std::string::operator+
// is a better match for string+string, so these never shadow it.
template <typename T>
std::string operator+(const std::string& lhs, const T& rhs) { return lhs + glint_to_string(rhs); }

template <typename T>
std::string operator+(const T& lhs, const std::string& rhs) { return glint_to_string(lhs) + rhs; }
"#;
