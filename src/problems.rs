//! Static practice-problem catalog.
//!
//! The catalog is compiled in and read-only: sessions reference problems by
//! id, and problem selection copies the per-language starter code into the
//! shared buffer. The `Language` identifiers are an external contract — they
//! must match the starter-code keys 1:1, so both serialize as the same
//! lowercase strings the clients send.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Languages selectable in a session.
///
/// JavaScript is the only family with an execution backend (TypeScript is
/// executed through it); the rest are editor/starter-code targets only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Javascript,
    Typescript,
    Python,
    Java,
    Cpp,
}

impl Language {
    /// Lowercase wire identifier, matching the serde representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Javascript => "javascript",
            Self::Typescript => "typescript",
            Self::Python => "python",
            Self::Java => "java",
            Self::Cpp => "cpp",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Problem difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A worked example shown alongside the problem statement.
#[derive(Debug, Clone, Serialize)]
pub struct Example {
    pub input: &'static str,
    pub output: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<&'static str>,
}

/// Starter code per language, substituted into the buffer on selection.
#[derive(Debug, Clone, Serialize)]
pub struct StarterCode {
    pub javascript: &'static str,
    pub typescript: &'static str,
    pub python: &'static str,
    pub java: &'static str,
    pub cpp: &'static str,
}

impl StarterCode {
    /// Starter text for `lang`. Every language has an entry in this catalog,
    /// so the JavaScript fallback only applies to future sparse entries.
    #[must_use]
    pub fn for_language(&self, lang: Language) -> &'static str {
        match lang {
            Language::Javascript => self.javascript,
            Language::Typescript => self.typescript,
            Language::Python => self.python,
            Language::Java => self.java,
            Language::Cpp => self.cpp,
        }
    }
}

/// An input/expected-output pair for manual verification.
#[derive(Debug, Clone, Serialize)]
pub struct TestCase {
    pub input: &'static str,
    pub expected_output: &'static str,
}

/// A catalog entry.
#[derive(Debug, Clone, Serialize)]
pub struct Problem {
    pub id: &'static str,
    pub title: &'static str,
    pub difficulty: Difficulty,
    pub description: &'static str,
    pub examples: Vec<Example>,
    pub constraints: Vec<&'static str>,
    pub starter_code: StarterCode,
    pub test_cases: Vec<TestCase>,
    pub hints: Vec<&'static str>,
    pub solution: &'static str,
    pub topics: Vec<&'static str>,
}

/// All problems, in catalog order.
pub fn all_problems() -> &'static [Problem] {
    static CATALOG: OnceLock<Vec<Problem>> = OnceLock::new();
    CATALOG.get_or_init(build_catalog)
}

/// Look up a problem by id.
#[must_use]
pub fn problem_by_id(id: &str) -> Option<&'static Problem> {
    all_problems().iter().find(|p| p.id == id)
}

/// Filter the catalog by difficulty tier.
#[must_use]
pub fn problems_by_difficulty(difficulty: Difficulty) -> Vec<&'static Problem> {
    all_problems()
        .iter()
        .filter(|p| p.difficulty == difficulty)
        .collect()
}

#[allow(clippy::too_many_lines)]
fn build_catalog() -> Vec<Problem> {
    vec![
        Problem {
            id: "two-sum",
            title: "Two Sum",
            difficulty: Difficulty::Easy,
            description: "Given an array of integers nums and an integer target, return indices of the two numbers such that they add up to target.\n\nYou may assume that each input would have exactly one solution, and you may not use the same element twice.\n\nYou can return the answer in any order.",
            examples: vec![
                Example {
                    input: "nums = [2,7,11,15], target = 9",
                    output: "[0,1]",
                    explanation: Some("Because nums[0] + nums[1] == 9, we return [0, 1]."),
                },
                Example {
                    input: "nums = [3,2,4], target = 6",
                    output: "[1,2]",
                    explanation: None,
                },
            ],
            constraints: vec![
                "2 <= nums.length <= 10^4",
                "-10^9 <= nums[i] <= 10^9",
                "-10^9 <= target <= 10^9",
                "Only one valid answer exists.",
            ],
            starter_code: StarterCode {
                javascript: "function twoSum(nums, target) {\n    // Your code here\n}",
                typescript: "function twoSum(nums: number[], target: number): number[] {\n    // Your code here\n    return [];\n}",
                python: "def two_sum(nums, target):\n    # Your code here\n    pass",
                java: "public int[] twoSum(int[] nums, int target) {\n    // Your code here\n    return new int[]{};\n}",
                cpp: "vector<int> twoSum(vector<int>& nums, int target) {\n    // Your code here\n    return {};\n}",
            },
            test_cases: vec![
                TestCase { input: "[2,7,11,15], 9", expected_output: "[0,1]" },
                TestCase { input: "[3,2,4], 6", expected_output: "[1,2]" },
                TestCase { input: "[3,3], 6", expected_output: "[0,1]" },
            ],
            hints: vec![
                "Try using a hash map to store numbers you've seen",
                "For each number, check if (target - current number) exists in the map",
                "The time complexity can be O(n) with this approach",
            ],
            solution: "The optimal solution uses a hash map to achieve O(n) time complexity. As we iterate through the array, we check if the complement (target - current number) exists in our map. If it does, we've found our answer. If not, we add the current number and its index to the map.",
            topics: vec!["Array", "Hash Table"],
        },
        Problem {
            id: "reverse-string",
            title: "Reverse String",
            difficulty: Difficulty::Easy,
            description: "Write a function that reverses a string. The input string is given as an array of characters s.\n\nYou must do this by modifying the input array in-place with O(1) extra memory.",
            examples: vec![
                Example {
                    input: "s = [\"h\",\"e\",\"l\",\"l\",\"o\"]",
                    output: "[\"o\",\"l\",\"l\",\"e\",\"h\"]",
                    explanation: None,
                },
                Example {
                    input: "s = [\"H\",\"a\",\"n\",\"n\",\"a\",\"h\"]",
                    output: "[\"h\",\"a\",\"n\",\"n\",\"a\",\"H\"]",
                    explanation: None,
                },
            ],
            constraints: vec![
                "1 <= s.length <= 10^5",
                "s[i] is a printable ascii character.",
            ],
            starter_code: StarterCode {
                javascript: "function reverseString(s) {\n    // Your code here\n}",
                typescript: "function reverseString(s: string[]): void {\n    // Your code here\n}",
                python: "def reverse_string(s):\n    # Your code here\n    pass",
                java: "public void reverseString(char[] s) {\n    // Your code here\n}",
                cpp: "void reverseString(vector<char>& s) {\n    // Your code here\n}",
            },
            test_cases: vec![
                TestCase {
                    input: "[\"h\",\"e\",\"l\",\"l\",\"o\"]",
                    expected_output: "[\"o\",\"l\",\"l\",\"e\",\"h\"]",
                },
                TestCase {
                    input: "[\"H\",\"a\",\"n\",\"n\",\"a\",\"h\"]",
                    expected_output: "[\"h\",\"a\",\"n\",\"n\",\"a\",\"H\"]",
                },
            ],
            hints: vec![
                "Use two pointers approach",
                "Start from both ends and swap characters",
                "Move pointers towards the center",
            ],
            solution: "Use two pointers starting from both ends of the array. Swap the characters at these pointers and move them towards the center until they meet.",
            topics: vec!["Two Pointers", "String"],
        },
        Problem {
            id: "valid-parentheses",
            title: "Valid Parentheses",
            difficulty: Difficulty::Easy,
            description: "Given a string s containing just the characters '(', ')', '{', '}', '[' and ']', determine if the input string is valid.\n\nAn input string is valid if:\n1. Open brackets must be closed by the same type of brackets.\n2. Open brackets must be closed in the correct order.\n3. Every close bracket has a corresponding open bracket of the same type.",
            examples: vec![
                Example { input: "s = \"()\"", output: "true", explanation: None },
                Example { input: "s = \"()[]{}\"", output: "true", explanation: None },
                Example { input: "s = \"(]\"", output: "false", explanation: None },
            ],
            constraints: vec![
                "1 <= s.length <= 10^4",
                "s consists of parentheses only '()[]{}'.",
            ],
            starter_code: StarterCode {
                javascript: "function isValid(s) {\n    // Your code here\n}",
                typescript: "function isValid(s: string): boolean {\n    // Your code here\n    return false;\n}",
                python: "def is_valid(s):\n    # Your code here\n    pass",
                java: "public boolean isValid(String s) {\n    // Your code here\n    return false;\n}",
                cpp: "bool isValid(string s) {\n    // Your code here\n    return false;\n}",
            },
            test_cases: vec![
                TestCase { input: "\"()\"", expected_output: "true" },
                TestCase { input: "\"()[]{}\"", expected_output: "true" },
                TestCase { input: "\"(]\"", expected_output: "false" },
                TestCase { input: "\"([)]\"", expected_output: "false" },
            ],
            hints: vec![
                "Think about using a stack data structure",
                "Push opening brackets onto the stack",
                "When you see a closing bracket, check if it matches the top of the stack",
            ],
            solution: "Use a stack to keep track of opening brackets. When encountering a closing bracket, check if it matches the most recent opening bracket (top of stack).",
            topics: vec!["Stack", "String"],
        },
        Problem {
            id: "fizzbuzz",
            title: "Fizz Buzz",
            difficulty: Difficulty::Easy,
            description: "Given an integer n, return a string array answer (1-indexed) where:\n\n- answer[i] == \"FizzBuzz\" if i is divisible by 3 and 5.\n- answer[i] == \"Fizz\" if i is divisible by 3.\n- answer[i] == \"Buzz\" if i is divisible by 5.\n- answer[i] == i (as a string) if none of the above conditions are true.",
            examples: vec![
                Example { input: "n = 3", output: "[\"1\",\"2\",\"Fizz\"]", explanation: None },
                Example {
                    input: "n = 5",
                    output: "[\"1\",\"2\",\"Fizz\",\"4\",\"Buzz\"]",
                    explanation: None,
                },
                Example {
                    input: "n = 15",
                    output: "[\"1\",\"2\",\"Fizz\",\"4\",\"Buzz\",\"Fizz\",\"7\",\"8\",\"Fizz\",\"Buzz\",\"11\",\"Fizz\",\"13\",\"14\",\"FizzBuzz\"]",
                    explanation: None,
                },
            ],
            constraints: vec!["1 <= n <= 10^4"],
            starter_code: StarterCode {
                javascript: "function fizzBuzz(n) {\n    // Your code here\n}",
                typescript: "function fizzBuzz(n: number): string[] {\n    // Your code here\n    return [];\n}",
                python: "def fizz_buzz(n):\n    # Your code here\n    pass",
                java: "public List<String> fizzBuzz(int n) {\n    // Your code here\n    return new ArrayList<>();\n}",
                cpp: "vector<string> fizzBuzz(int n) {\n    // Your code here\n    return {};\n}",
            },
            test_cases: vec![
                TestCase { input: "3", expected_output: "[\"1\",\"2\",\"Fizz\"]" },
                TestCase { input: "5", expected_output: "[\"1\",\"2\",\"Fizz\",\"4\",\"Buzz\"]" },
                TestCase {
                    input: "15",
                    expected_output: "[\"1\",\"2\",\"Fizz\",\"4\",\"Buzz\",\"Fizz\",\"7\",\"8\",\"Fizz\",\"Buzz\",\"11\",\"Fizz\",\"13\",\"14\",\"FizzBuzz\"]",
                },
            ],
            hints: vec![
                "Check divisibility by 15 first (both 3 and 5)",
                "Then check divisibility by 3",
                "Then check divisibility by 5",
                "Otherwise, just add the number as a string",
            ],
            solution: "Iterate from 1 to n. For each number, check divisibility conditions in order: 15 (FizzBuzz), 3 (Fizz), 5 (Buzz), or the number itself.",
            topics: vec!["Math", "String"],
        },
        Problem {
            id: "palindrome-number",
            title: "Palindrome Number",
            difficulty: Difficulty::Easy,
            description: "Given an integer x, return true if x is a palindrome, and false otherwise.\n\nAn integer is a palindrome when it reads the same forward and backward.\n\nFor example, 121 is a palindrome while 123 is not.",
            examples: vec![
                Example {
                    input: "x = 121",
                    output: "true",
                    explanation: Some("121 reads as 121 from left to right and from right to left."),
                },
                Example {
                    input: "x = -121",
                    output: "false",
                    explanation: Some("From left to right, it reads -121. From right to left, it becomes 121-. Therefore it is not a palindrome."),
                },
                Example {
                    input: "x = 10",
                    output: "false",
                    explanation: Some("Reads 01 from right to left. Therefore it is not a palindrome."),
                },
            ],
            constraints: vec!["-2^31 <= x <= 2^31 - 1"],
            starter_code: StarterCode {
                javascript: "function isPalindrome(x) {\n    // Your code here\n}",
                typescript: "function isPalindrome(x: number): boolean {\n    // Your code here\n    return false;\n}",
                python: "def is_palindrome(x):\n    # Your code here\n    pass",
                java: "public boolean isPalindrome(int x) {\n    // Your code here\n    return false;\n}",
                cpp: "bool isPalindrome(int x) {\n    // Your code here\n    return false;\n}",
            },
            test_cases: vec![
                TestCase { input: "121", expected_output: "true" },
                TestCase { input: "-121", expected_output: "false" },
                TestCase { input: "10", expected_output: "false" },
            ],
            hints: vec![
                "Negative numbers are never palindromes",
                "You can convert to string or reverse the number mathematically",
                "The mathematical approach is more elegant",
            ],
            solution: "Check if negative (return false). Then reverse the number by extracting digits and rebuilding. Compare reversed with original.",
            topics: vec!["Math"],
        },
    ]
}
